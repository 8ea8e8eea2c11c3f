//! Turning FILE arguments into paths

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Expand FILE arguments in order.
///
/// Glob patterns are expanded for shells that do not do it themselves, and
/// directories contribute their Markdown files (non-recursive). Anything else
/// is passed through as-is so that a missing file is reported as unreadable
/// rather than dropped.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);

        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && is_markdown(p))
                .collect();
            entries.sort();
            files.extend(entries);
            continue;
        }

        if !path.exists() && pattern.contains(['*', '?', '[']) {
            let mut matches: Vec<PathBuf> = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {}", pattern))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();
            if matches.is_empty() {
                log::warn!("no files matched: {}", pattern);
            }
            matches.sort();
            files.extend(matches);
            continue;
        }

        files.push(path.to_path_buf());
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
}
