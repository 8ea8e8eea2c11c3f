//! Line-level region classification.
//!
//! The engines never need a full Markdown parser. They need to know which
//! lines are code, which are footnote definitions, and which are prose, so
//! the scanner tags line ranges with a [`RegionKind`] and leaves the rest to
//! the callers.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::front_matter::front_matter_lines;

static RE_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\[\^([\w-]+)\]:").unwrap());
static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z][A-Za-z0-9+.-]*://|www\.)\S+").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    FrontMatter,
    FencedCode,
    FootnoteDefinition,
    Prose,
}

/// A run of lines sharing one [`RegionKind`]. `lines` is half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub lines: Range<usize>,
}

impl Region {
    fn new(kind: RegionKind, lines: Range<usize>) -> Self {
        Self { kind, lines }
    }

    /// Text covered by this region, line terminators included
    pub fn text<S: AsRef<str>>(&self, lines: &[S]) -> String {
        lines[self.lines.clone()]
            .iter()
            .map(AsRef::<str>::as_ref)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

/// Split a document's lines into disjoint, ordered regions covering every line.
///
/// A fence opener without a closer turns the rest of the document into code.
pub fn classify<S: AsRef<str>>(lines: &[S]) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();
    let mut idx = 0;

    if let Some(block) = front_matter_lines(lines) {
        idx = block.end;
        regions.push(Region::new(RegionKind::FrontMatter, block));
    }

    while idx < lines.len() {
        let line = strip_line_ending(lines[idx].as_ref());

        if let Some(fence) = fence_open(line) {
            let closer = lines[idx + 1..]
                .iter()
                .position(|l| fence_closes(fence, strip_line_ending(l.as_ref())));
            let end = match closer {
                Some(offset) => idx + offset + 2,
                None => {
                    log::debug!("unterminated code fence at line {}", idx + 1);
                    lines.len()
                }
            };
            regions.push(Region::new(RegionKind::FencedCode, idx..end));
            idx = end;
            continue;
        }

        if definition_id_span(line).is_some() {
            let mut end = idx + 1;
            while end < lines.len() {
                let next = strip_line_ending(lines[end].as_ref());
                if !is_continuation(next) || definition_id_span(next).is_some() {
                    break;
                }
                end += 1;
            }
            regions.push(Region::new(RegionKind::FootnoteDefinition, idx..end));
            idx = end;
            continue;
        }

        match regions.last_mut() {
            Some(last) if last.kind == RegionKind::Prose && last.lines.end == idx => {
                last.lines.end = idx + 1;
            }
            _ => regions.push(Region::new(RegionKind::Prose, idx..idx + 1)),
        }
        idx += 1;
    }

    regions
}

/// Region kind of every line, indexed by line number
pub fn line_kinds(regions: &[Region], line_count: usize) -> Vec<RegionKind> {
    let mut kinds = vec![RegionKind::Prose; line_count];
    for region in regions {
        for kind in &mut kinds[region.lines.clone()] {
            *kind = region.kind;
        }
    }
    kinds
}

/// The line without its trailing `\n` or `\r\n`
pub fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Byte span of the id in a footnote definition line (`[^id]: ...`)
pub fn definition_id_span(line: &str) -> Option<Range<usize>> {
    RE_DEFINITION
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// Byte spans of bare URL tokens (`scheme://...` or `www....`)
pub fn url_spans(text: &str) -> Vec<Range<usize>> {
    RE_URL.find_iter(text).map(|m| m.range()).collect()
}

/// Byte spans of backtick code spans within a single line, delimiters included.
///
/// A run of backticks only closes a span opened by a run of the same length;
/// an opener with no closer is literal text.
pub fn inline_code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'`' {
            pos += 1;
            continue;
        }
        let open_len = backtick_run(bytes, pos);
        let mut search = pos + open_len;
        let mut closed = None;
        while search < bytes.len() {
            if bytes[search] == b'`' {
                let run = backtick_run(bytes, search);
                if run == open_len {
                    closed = Some(search + run);
                    break;
                }
                search += run;
            } else {
                search += 1;
            }
        }
        match closed {
            Some(end) => {
                spans.push(pos..end);
                pos = end;
            }
            None => pos += open_len,
        }
    }

    spans
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

/// Openers may sit at any indentation, so fences nested in list items count
fn fence_open(line: &str) -> Option<Fence> {
    let rest = line.trim_start_matches([' ', '\t']);
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }
    // Backtick fences cannot carry backticks in their info string
    if marker == '`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { marker, len })
}

fn fence_closes(fence: Fence, line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence.len && trimmed.chars().all(|c| c == fence.marker)
}

fn is_continuation(line: &str) -> bool {
    !is_blank(line) && line.starts_with([' ', '\t'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split_inclusive('\n').collect()
    }

    fn kinds(text: &str) -> Vec<(RegionKind, Range<usize>)> {
        classify(&lines(text))
            .into_iter()
            .map(|r| (r.kind, r.lines))
            .collect()
    }

    #[test]
    fn test_plain_prose_is_one_region() {
        assert_eq!(kinds("one\ntwo\n\nthree\n"), vec![(RegionKind::Prose, 0..4)]);
    }

    #[test]
    fn test_empty_document() {
        assert!(classify::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_fenced_code_inclusive() {
        let text = "intro\n```rust\nlet x = 1;\n```\noutro\n";
        assert_eq!(
            kinds(text),
            vec![
                (RegionKind::Prose, 0..1),
                (RegionKind::FencedCode, 1..4),
                (RegionKind::Prose, 4..5),
            ]
        );
    }

    #[test]
    fn test_tilde_fence_and_longer_closer() {
        let text = "~~~\ncode\n~~~~~\nafter\n";
        assert_eq!(
            kinds(text),
            vec![(RegionKind::FencedCode, 0..3), (RegionKind::Prose, 3..4)]
        );
    }

    #[test]
    fn test_backtick_fence_not_closed_by_tildes() {
        let text = "```\ncode\n~~~\nstill code\n```\n";
        assert_eq!(kinds(text), vec![(RegionKind::FencedCode, 0..5)]);
    }

    #[test]
    fn test_fence_nested_in_list_item() {
        let text = "- Step one\n    - Nested step\n\n        ```\n        code [^zz]\n        ```\n\nAfter\n";
        assert_eq!(
            kinds(text),
            vec![
                (RegionKind::Prose, 0..3),
                (RegionKind::FencedCode, 3..6),
                (RegionKind::Prose, 6..8),
            ]
        );
    }

    #[test]
    fn test_tab_indented_fence() {
        let text = "\t~~~\n\tcode\n\t~~~\n";
        assert_eq!(kinds(text), vec![(RegionKind::FencedCode, 0..3)]);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "prose\n```\ncode\n[^1]: not a definition\n";
        assert_eq!(
            kinds(text),
            vec![(RegionKind::Prose, 0..1), (RegionKind::FencedCode, 1..4)]
        );
    }

    #[test]
    fn test_definition_with_continuation() {
        let text = "Body[^1].\n\n[^1]: First line\n    continued here\n[^2]: Second\n\nAfter\n";
        assert_eq!(
            kinds(text),
            vec![
                (RegionKind::Prose, 0..2),
                (RegionKind::FootnoteDefinition, 2..4),
                (RegionKind::FootnoteDefinition, 4..5),
                (RegionKind::Prose, 5..7),
            ]
        );
    }

    #[test]
    fn test_front_matter_region() {
        let text = "---\ntitle: Viikko 3\n---\nText\n";
        assert_eq!(
            kinds(text),
            vec![(RegionKind::FrontMatter, 0..3), (RegionKind::Prose, 3..4)]
        );
    }

    #[test]
    fn test_line_kinds_lookup() {
        let text = "a\n```\nb\n```\n[^x]: y\n";
        let l = lines(text);
        let per_line = line_kinds(&classify(&l), l.len());
        assert_eq!(
            per_line,
            vec![
                RegionKind::Prose,
                RegionKind::FencedCode,
                RegionKind::FencedCode,
                RegionKind::FencedCode,
                RegionKind::FootnoteDefinition,
            ]
        );
    }

    #[test]
    fn test_region_text() {
        let l = lines("a\n```\nb\n```\n");
        let regions = classify(&l);
        assert_eq!(regions[1].text(&l), "```\nb\n```\n");
    }

    #[test]
    fn test_definition_id_span() {
        let line = "[^my-ref]: Doe, J. (2022).";
        assert_eq!(definition_id_span(line).map(|r| &line[r]), Some("my-ref"));
        assert!(definition_id_span("   [^1]: indented up to three").is_some());
        assert!(definition_id_span("    [^1]: four spaces is code").is_none());
        assert!(definition_id_span("Text [^1]: inline").is_none());
        assert!(definition_id_span("[^has space]: nope").is_none());
    }

    #[test]
    fn test_url_spans() {
        let text = "See [site](https://example.com/a?b=c) or www.kela.fi today";
        let urls: Vec<&str> = url_spans(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(urls, vec!["https://example.com/a?b=c)", "www.kela.fi"]);
    }

    #[test]
    fn test_inline_code_spans() {
        let line = "use `[^1]` and ``a ` b`` but not `open";
        let spans: Vec<&str> = inline_code_spans(line)
            .into_iter()
            .map(|r| &line[r])
            .collect();
        assert_eq!(spans, vec!["`[^1]`", "``a ` b``"]);
    }

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending("a\r\n"), "a");
        assert_eq!(strip_line_ending("a\n"), "a");
        assert_eq!(strip_line_ending("a"), "a");
    }
}
