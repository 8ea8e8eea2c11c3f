//! Prose word counting

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::doc::Document;
use crate::scanner::{self, RegionKind};

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static RE_FOOTNOTE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^[\w-]+\]").unwrap());

/// Count words in prose regions.
///
/// Code blocks, footnote definitions, front matter, URLs and `[^id]` markers
/// are not prose. Tokens made only of underscores (`___` rules) are not words.
pub fn count(doc: &Document) -> usize {
    let lines = doc.lines();
    scanner::classify(&lines)
        .iter()
        .filter(|region| region.kind == RegionKind::Prose)
        .map(|region| count_prose(&region.text(&lines)))
        .sum()
}

/// Count words of in-memory Markdown text
pub fn count_text(text: &str) -> usize {
    count(&Document::from_text("<text>", text))
}

fn count_prose(text: &str) -> usize {
    let markers: Vec<Range<usize>> = RE_FOOTNOTE_MARKER
        .find_iter(text)
        .map(|m| m.range())
        .collect();
    let without_markers = blank_out(text, &markers);
    let without_urls = blank_out(&without_markers, &scanner::url_spans(&without_markers));

    RE_WORD
        .find_iter(&without_urls)
        .filter(|m| m.as_str().chars().any(char::is_alphanumeric))
        .count()
}

/// Replace each span with a single space so neighbouring words stay apart
fn blank_out(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        out.push(' ');
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
