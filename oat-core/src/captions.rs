//! Image caption numbering
//!
//! Captions are single lines of the form `**Kuva N**: text`. They must be
//! numbered 1, 2, 3, ... in document order.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use crate::doc::Document;
use crate::scanner::{self, RegionKind};

// Anything that opens like a caption. Validity is decided afterwards so that
// near misses can be reported instead of silently skipped.
static RE_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*\*\*Kuva (?P<num>[^*:]*)(?P<inner>:)?\*\*(?P<outer>:)?(?P<rest>.*)$")
        .unwrap()
});

/// A correctly formed caption line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    /// 1-based line number
    pub line: usize,
    pub declared_number: usize,
    pub body_text: String,
    /// Byte span of the number inside the line
    number_span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// `**Kuva **: text`
    MissingNumber,
    /// `**Kuva x**: text`, or a number that is not a positive integer
    InvalidNumber(String),
    /// `**Kuva 1:**`, the colon belongs after the bold markers
    ColonInsideBold,
    /// `**Kuva 1**:` with nothing after the colon
    MissingText,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingNumber => f.write_str("missing number"),
            MalformedReason::InvalidNumber(raw) => write!(f, "invalid number {raw:?}"),
            MalformedReason::ColonInsideBold => f.write_str("colon inside bolding"),
            MalformedReason::MissingText => f.write_str("missing caption text"),
        }
    }
}

/// A line that looks like a caption but cannot be numbered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCaption {
    /// 1-based line number
    pub line: usize,
    pub content: String,
    pub reason: MalformedReason,
}

/// A caption whose number is out of sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionIssue {
    pub line: usize,
    pub declared: usize,
    pub expected: usize,
    /// The number was already used by an earlier caption
    pub duplicate: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct CaptionReport {
    pub captions: usize,
    pub issues: Vec<CaptionIssue>,
    pub malformed: Vec<MalformedCaption>,
}

impl CaptionReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.malformed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CaptionFix {
    pub content: String,
    pub changed: bool,
    /// Number of captions that got a new number
    pub renumbered: usize,
    /// Left as they were
    pub malformed: Vec<MalformedCaption>,
}

/// Parse one line. `None` means the line is not caption-like at all.
pub fn parse_caption(line: &str, line_idx: usize) -> Option<Result<Caption, MalformedCaption>> {
    let line = scanner::strip_line_ending(line);
    let caps = RE_CAPTION.captures(line)?;
    let (num, rest) = (caps.name("num")?, caps.name("rest")?);

    // Plain bold "**Kuva 2** shows ..." without any colon is prose
    if caps.name("inner").is_none() && caps.name("outer").is_none() {
        return None;
    }

    let malformed = |reason| {
        Some(Err(MalformedCaption {
            line: line_idx + 1,
            content: line.trim().to_string(),
            reason,
        }))
    };

    if caps.name("inner").is_some() {
        return malformed(MalformedReason::ColonInsideBold);
    }
    if num.as_str().is_empty() {
        return malformed(MalformedReason::MissingNumber);
    }
    let declared_number = match num.as_str().parse::<usize>() {
        Ok(n) if n > 0 && num.as_str().bytes().all(|b| b.is_ascii_digit()) => n,
        _ => return malformed(MalformedReason::InvalidNumber(num.as_str().to_string())),
    };
    let body_text = rest.as_str().trim();
    if body_text.is_empty() {
        return malformed(MalformedReason::MissingText);
    }

    Some(Ok(Caption {
        line: line_idx + 1,
        declared_number,
        body_text: body_text.to_string(),
        number_span: num.range(),
    }))
}

/// Valid and malformed captions in document order, skipping code and front matter
pub fn scan(doc: &Document) -> (Vec<Caption>, Vec<MalformedCaption>) {
    let lines = doc.lines();
    let kinds = scanner::line_kinds(&scanner::classify(&lines), lines.len());

    let mut captions = Vec::new();
    let mut malformed = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if matches!(kinds[idx], RegionKind::FencedCode | RegionKind::FrontMatter) {
            continue;
        }
        match parse_caption(line, idx) {
            Some(Ok(caption)) => captions.push(caption),
            Some(Err(bad)) => malformed.push(bad),
            None => {}
        }
    }

    log::debug!(
        "{}: {} captions, {} malformed",
        doc.path.display(),
        captions.len(),
        malformed.len()
    );

    (captions, malformed)
}

/// Report every caption that breaks the 1, 2, 3, ... sequence
pub fn check(doc: &Document) -> CaptionReport {
    let (captions, malformed) = scan(doc);
    let mut seen = HashSet::new();

    let issues = captions
        .iter()
        .enumerate()
        .filter_map(|(i, caption)| {
            let expected = i + 1;
            let duplicate = !seen.insert(caption.declared_number);
            (caption.declared_number != expected || duplicate).then(|| CaptionIssue {
                line: caption.line,
                declared: caption.declared_number,
                expected,
                duplicate,
                text: caption.body_text.clone(),
            })
        })
        .collect();

    CaptionReport {
        captions: captions.len(),
        issues,
        malformed,
    }
}

/// Renumber captions by position. Malformed lines are left byte-identical.
pub fn fix(doc: &Document) -> CaptionFix {
    let (captions, malformed) = scan(doc);
    let mut lines = doc.lines();
    let mut renumbered = 0;

    for (i, caption) in captions.iter().enumerate() {
        let expected = i + 1;
        if caption.declared_number == expected {
            continue;
        }
        lines[caption.line - 1].replace_range(caption.number_span.clone(), &expected.to_string());
        renumbered += 1;
    }

    let content = lines.concat();
    CaptionFix {
        changed: renumbered > 0,
        content,
        renumbered,
        malformed,
    }
}

/// Shorten caption text for tabular output
pub fn preview(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::from_text("test.md", text)
    }

    fn parsed(line: &str) -> Caption {
        parse_caption(line, 0)
            .expect("caption-like")
            .expect("valid caption")
    }

    fn reason(line: &str) -> MalformedReason {
        parse_caption(line, 0)
            .expect("caption-like")
            .expect_err("malformed caption")
            .reason
    }

    #[test]
    fn test_parse_valid_caption() {
        let caption = parsed("**Kuva 123**: Large number caption");
        assert_eq!(caption.declared_number, 123);
        assert_eq!(caption.body_text, "Large number caption");
        assert_eq!(caption.line, 1);
    }

    #[test]
    fn test_parse_with_leading_whitespace_and_special_characters() {
        let caption = parsed("  **Kuva 1**: Caption with (special) characters!\n");
        assert_eq!(caption.body_text, "Caption with (special) characters!");
    }

    #[test]
    fn test_not_caption_lines() {
        assert!(parse_caption("This is just regular text", 0).is_none());
        assert!(parse_caption("Kuva 1: No asterisks", 0).is_none());
        assert!(parse_caption("**Kuva 2** näyttää tuloksen", 0).is_none());
        assert!(parse_caption("", 0).is_none());
    }

    #[test]
    fn test_malformed_reasons() {
        assert_eq!(reason("**Kuva 1:**"), MalformedReason::ColonInsideBold);
        assert_eq!(reason("  **Kuva 4:** Text"), MalformedReason::ColonInsideBold);
        assert_eq!(reason("**Kuva **: Missing number"), MalformedReason::MissingNumber);
        assert_eq!(
            reason("**Kuva x**: Not a number"),
            MalformedReason::InvalidNumber("x".to_string())
        );
        assert_eq!(
            reason("**Kuva 0**: Zero"),
            MalformedReason::InvalidNumber("0".to_string())
        );
        assert_eq!(
            reason("**Kuva +3**: Signed"),
            MalformedReason::InvalidNumber("+3".to_string())
        );
        assert_eq!(reason("**Kuva 2**:"), MalformedReason::MissingText);
    }

    #[test]
    fn test_check_in_order() {
        let report = check(&doc("**Kuva 1**: First\n**Kuva 2**: Second\n**Kuva 3**: Third\n"));
        assert_eq!(report.captions, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_check_reports_expected_numbers() {
        let report = check(&doc("**Kuva 3**: Should be 1\n**Kuva 5**: Should be 2\n"));
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].declared, 3);
        assert_eq!(report.issues[0].expected, 1);
        assert_eq!(report.issues[1].declared, 5);
        assert_eq!(report.issues[1].expected, 2);
        assert_eq!(report.issues[1].line, 2);
    }

    #[test]
    fn test_check_flags_duplicate_even_when_number_matches() {
        let report = check(&doc("**Kuva 1**: a\n\n**Kuva 3**: b\n\n**Kuva 3**: c\n"));
        let summary: Vec<(usize, usize, usize, bool)> = report
            .issues
            .iter()
            .map(|i| (i.line, i.declared, i.expected, i.duplicate))
            .collect();
        assert_eq!(summary, vec![(3, 3, 2, false), (5, 3, 3, true)]);
    }

    #[test]
    fn test_fix_renumbers_duplicates() {
        let fixed = fix(&doc("**Kuva 1**: a\n**Kuva 3**: b\n**Kuva 3**: c\n"));
        assert_eq!(fixed.content, "**Kuva 1**: a\n**Kuva 2**: b\n**Kuva 3**: c\n");
        assert_eq!(fixed.renumbered, 1);
        assert!(fixed.changed);
    }

    #[test]
    fn test_fix_preserves_other_content() {
        let text = "# Title\n\nParagraph text here.\n\n  **Kuva 99**: Caption  \n\n## Another section\n";
        let fixed = fix(&doc(text));
        assert_eq!(
            fixed.content,
            "# Title\n\nParagraph text here.\n\n  **Kuva 1**: Caption  \n\n## Another section\n"
        );
    }

    #[test]
    fn test_fix_skips_malformed_without_shifting_sequence() {
        let text = "**Kuva 5**: Correct\n\n**Kuva 2:**\n\n**Kuva 7**: Another correct\n";
        let fixed = fix(&doc(text));
        assert_eq!(
            fixed.content,
            "**Kuva 1**: Correct\n\n**Kuva 2:**\n\n**Kuva 2**: Another correct\n"
        );
        assert_eq!(fixed.malformed.len(), 1);
        assert_eq!(fixed.malformed[0].line, 3);
    }

    #[test]
    fn test_captions_in_code_blocks_are_ignored() {
        let text = "**Kuva 1**: Real\n\n```markdown\n**Kuva 9**: Example syntax\n```\n";
        let report = check(&doc(text));
        assert_eq!(report.captions, 1);
        assert!(report.is_clean());
        assert!(!fix(&doc(text)).changed);
    }

    #[test]
    fn test_captions_in_list_item_code_blocks_are_ignored() {
        let text = "- Step one\n    - Nested step\n\n        ```\n        secret code words here [^zz]\n        **Kuva 9**: not a caption\n        ```\n\n**Kuva 1**: Real\n";
        let report = check(&doc(text));
        assert_eq!(report.captions, 1);
        assert!(report.is_clean());

        let fixed = fix(&doc(text));
        assert!(!fixed.changed);
        assert_eq!(fixed.content, text);
    }

    #[test]
    fn test_line_numbers_ignore_unicode_separators() {
        let report = check(&doc("Intro text\u{2028}more intro\n**Kuva 2**: Cap\n"));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].line, 2);
    }

    #[test]
    fn test_fix_no_changes_needed() {
        let text = "**Kuva 1**: First\n**Kuva 2**: Second";
        let fixed = fix(&doc(text));
        assert!(!fixed.changed);
        assert_eq!(fixed.content, text);
    }

    #[test]
    fn test_fix_is_idempotent() {
        let once = fix(&doc("**Kuva 4**: a\n**Kuva 4**: b\ntext\n**Kuva 1**: c\n"));
        let twice = fix(&doc(&once.content));
        assert!(!twice.changed);
        assert_eq!(once.content, twice.content);
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("äöäöäö", 3), "äöä...");
    }
}
