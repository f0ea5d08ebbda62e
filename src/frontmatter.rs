use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::fs;
use std::path::Path;

/// Reads a Markdown file and returns its frontmatter as a JSON document.
/// Files without frontmatter yield `None`; unreadable ones are logged.
pub fn read_document(path: &Path) -> Option<JsonValue> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read file");
            return None;
        }
    };
    let yaml = extract(&content)?;
    match to_document(yaml) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid frontmatter");
            None
        }
    }
}

fn extract(content: &str) -> Option<&str> {
    let rest = content.trim_start().strip_prefix("---")?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

fn to_document(yaml: &str) -> Result<JsonValue, Box<dyn std::error::Error>> {
    let value: YamlValue = serde_yaml::from_str(yaml)?;
    if !value.is_mapping() {
        return Err("frontmatter is not a mapping".into());
    }
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_from_frontmatter() {
        let content = r#"---
deck: japanese
tags: [hard, verbs]
level: 3
due: 2024-06-01
---
Body content"#;
        let doc = to_document(extract(content).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({"deck": "japanese", "tags": ["hard", "verbs"], "level": 3, "due": "2024-06-01"})
        );
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(extract("Just body content").is_none());
        assert!(extract("---\nunterminated: yes").is_none());
    }

    #[test]
    fn test_scalar_frontmatter_rejected() {
        assert!(to_document("just text").is_err());
    }

    #[test]
    fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.md");
        fs::write(&path, "---\nfront: neko\n---\n").unwrap();
        assert_eq!(read_document(&path), Some(json!({"front": "neko"})));
        assert_eq!(read_document(&dir.path().join("missing.md")), None);
    }
}
