//! Unified diff preview of a rewrite

use similar::TextDiff;
use std::path::Path;

/// Unified diff between the current and the proposed file content.
///
/// Empty when the two are identical.
pub fn unified(path: &Path, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let name = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

/// Number of lines removed and added by a rewrite
pub fn line_changes(old: &str, new: &str) -> (usize, usize) {
    use similar::ChangeTag;

    let diff = TextDiff::from_lines(old, new);
    diff.iter_all_changes()
        .fold((0, 0), |(removed, added), change| match change.tag() {
            ChangeTag::Delete => (removed + 1, added),
            ChangeTag::Insert => (removed, added + 1),
            ChangeTag::Equal => (removed, added),
        })
}
