//! Front matter block at the top of a diary file

use std::ops::Range;

/// Opening and closing marker pairs: YAML, TOML and the two JSON styles
const MARKERS: [(&str, &str); 4] = [("---", "---"), ("+++", "+++"), ("===", "==="), ("{/", "/}")];

/// Lines taken up by a front matter block, closing marker included.
///
/// The block must start on the first line. An opening marker that is never
/// closed is ordinary text.
pub fn front_matter_lines<S: AsRef<str>>(lines: &[S]) -> Option<Range<usize>> {
    let first = marker_text(lines.first()?.as_ref());
    let (_, close) = MARKERS.iter().find(|(open, _)| first == *open)?;

    lines
        .iter()
        .skip(1)
        .position(|line| marker_text(line.as_ref()) == *close)
        .map(|offset| 0..offset + 2)
}

fn marker_text(line: &str) -> &str {
    line.trim().trim_start_matches('\u{feff}')
}
