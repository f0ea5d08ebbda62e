use ignore::WalkBuilder;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

pub const IGNORE_FILE: &str = ".searchqignore";

/// Markdown files under `root`, honoring `.gitignore` and `.searchqignore`.
/// Sorted so output order does not depend on the filesystem.
pub fn collect_markdown_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .add_custom_ignore_filename(IGNORE_FILE)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    tracing::debug!(root = %root.display(), count = files.len(), "collected documents");
    files
}

pub fn read_paths_from_stdin() -> Vec<PathBuf> {
    paths_from_lines(io::stdin().lock())
}

fn paths_from_lines(reader: impl BufRead) -> Vec<PathBuf> {
    reader
        .lines()
        .map_while(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
