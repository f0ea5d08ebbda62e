use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::query::Rule;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read rule file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rule file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Loads a [`Rule`] from a YAML (or JSON) file with `anyOf`, `isString` and
/// `isDate` lists.
pub fn load_rule(path: &Path) -> Result<Rule, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rule = parse_rule(&content).map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        any_of = rule.any_of.len(),
        is_string = rule.is_string.len(),
        is_date = rule.is_date.len(),
        "loaded rule file"
    );
    Ok(rule)
}

fn parse_rule(content: &str) -> Result<Rule, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Rule::default());
    }
    serde_yaml::from_str(content)
}
