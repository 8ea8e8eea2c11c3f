//! Footnote reference reconciliation and renumbering
//!
//! Appearances are `[^id]` tokens in prose; definitions are `[^id]: text`
//! lines at the start of a line. A definition body may cite other footnotes
//! too. An id with appearances but no definition is an orphan, a definition
//! nobody cites is unused. Fixing removes unused definitions and renumbers
//! the rest `1, 2, 3, ...` in order of first appearance.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use crate::doc::Document;
use crate::error::{Error, Result};
use crate::scanner::{self, RegionKind};

static RE_APPEARANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^([\w-]+)\]").unwrap());

/// 1-based line and column of a token, for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    fn in_line(line_idx: usize, line: &str, byte_offset: usize) -> Self {
        Self {
            line: line_idx + 1,
            column: line[..byte_offset].chars().count() + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One `[^id]` citation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub id: String,
    pub position: Position,
    /// Byte span of the id inside its line
    pub raw_span: Range<usize>,
    /// Id of the definition whose body holds this citation, `None` in prose
    pub in_definition: Option<String>,
}

/// One `[^id]: body` definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDefinition {
    pub id: String,
    pub position: Position,
    pub body_text: String,
    /// Byte span of the id inside the first line
    pub raw_span: Range<usize>,
    /// Lines covered by the definition, continuation lines included
    pub lines: Range<usize>,
}

/// All appearances and definitions of one document, in document order
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    pub appearances: Vec<Appearance>,
    /// Citations inside definition bodies
    pub nested: Vec<Appearance>,
    pub definitions: Vec<ReferenceDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub id: String,
    pub positions: Vec<Position>,
}

/// Old id to new id; orphans map to themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbering {
    pub old: String,
    pub new: String,
}

impl Renumbering {
    pub fn is_identity(&self) -> bool {
        self.old == self.new
    }
}

impl ReferenceSet {
    /// Ids in order of first appearance, each once.
    ///
    /// Prose comes first. A citation inside a definition body counts only
    /// once the definition holding it is itself cited, so ids reached that
    /// way follow the prose ids.
    pub fn first_appearance_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut order: Vec<&str> = self
            .appearances
            .iter()
            .map(|a| a.id.as_str())
            .filter(|id| seen.insert(*id))
            .collect();

        loop {
            let before = order.len();
            for citation in &self.nested {
                let Some(owner) = citation.in_definition.as_deref() else {
                    continue;
                };
                if seen.contains(owner) && seen.insert(citation.id.as_str()) {
                    order.push(citation.id.as_str());
                }
            }
            if order.len() == before {
                break order;
            }
        }
    }

    /// Every citation of `id`, prose first, then definition bodies
    pub fn appearances_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Appearance> {
        self.appearances
            .iter()
            .chain(&self.nested)
            .filter(move |a| a.id == id)
    }

    pub fn definition(&self, id: &str) -> Option<&ReferenceDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Appearances with no definition, grouped by id in first-appearance order
    pub fn orphans(&self) -> Vec<Orphan> {
        self.first_appearance_order()
            .into_iter()
            .filter(|id| self.definition(id).is_none())
            .map(|id| Orphan {
                id: id.to_string(),
                positions: self.appearances_of(id).map(|a| a.position).collect(),
            })
            .collect()
    }

    /// Definitions not reachable from prose
    pub fn unused(&self) -> Vec<&ReferenceDefinition> {
        let appearing: HashSet<&str> = self.first_appearance_order().into_iter().collect();
        self.definitions
            .iter()
            .filter(|d| !appearing.contains(d.id.as_str()))
            .collect()
    }

    /// New id for every appearing id, in first-appearance order.
    ///
    /// Defined ids get `1, 2, 3, ...`. Orphans keep their id, and a number
    /// already taken by an orphan is skipped so no appearance changes which
    /// footnote it points to.
    pub fn renumbering(&self) -> Vec<Renumbering> {
        let order = self.first_appearance_order();
        let orphans: HashSet<&str> = order
            .iter()
            .copied()
            .filter(|id| self.definition(id).is_none())
            .collect();

        let mut next = 1usize;
        order
            .into_iter()
            .map(|id| {
                let new = if orphans.contains(id) {
                    id.to_string()
                } else {
                    loop {
                        let candidate = next.to_string();
                        next += 1;
                        if !orphans.contains(candidate.as_str()) {
                            break candidate;
                        }
                    }
                };
                Renumbering {
                    old: id.to_string(),
                    new,
                }
            })
            .collect()
    }
}

/// Read-only findings for one document
#[derive(Debug, Clone, Default)]
pub struct ReferenceReport {
    pub orphans: Vec<Orphan>,
    pub unused: Vec<ReferenceDefinition>,
    /// Definitions whose body is empty (`[^id]:` and nothing else)
    pub empty: Vec<ReferenceDefinition>,
    pub renumbering: Vec<Renumbering>,
}

impl ReferenceReport {
    pub fn needs_renumbering(&self) -> bool {
        self.renumbering.iter().any(|r| !r.is_identity())
    }

    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
            && self.unused.is_empty()
            && self.empty.is_empty()
            && !self.needs_renumbering()
    }
}

/// Result of rewriting one document
#[derive(Debug, Clone)]
pub struct ReferenceFix {
    pub content: String,
    pub changed: bool,
    /// Renumberings that were applied (identity mappings left out)
    pub renumbered: Vec<Renumbering>,
    /// Ids of the unused definitions that were removed
    pub removed: Vec<String>,
    /// Orphans, reported but left in place
    pub orphans: Vec<Orphan>,
}

/// Collect appearances and definitions.
///
/// Fails with [`Error::DuplicateDefinition`] when an id is defined twice.
pub fn analyze(doc: &Document) -> Result<ReferenceSet> {
    let lines = doc.lines();
    let mut set = ReferenceSet::default();
    let mut defined_at: HashMap<String, usize> = HashMap::new();

    for region in scanner::classify(&lines) {
        match region.kind {
            RegionKind::Prose => {
                for idx in region.lines.clone() {
                    collect_appearances(idx, &lines[idx], 0, None, &mut set.appearances);
                }
            }
            RegionKind::FootnoteDefinition => {
                let idx = region.lines.start;
                let first = scanner::strip_line_ending(&lines[idx]);
                let Some(raw_span) = scanner::definition_id_span(first) else {
                    continue;
                };
                let id = first[raw_span.clone()].to_string();

                if let Some(&first_line) = defined_at.get(&id) {
                    return Err(Error::DuplicateDefinition {
                        id,
                        first_line,
                        second_line: idx + 1,
                    });
                }
                defined_at.insert(id.clone(), idx + 1);

                let body_start = raw_span.end + 2;
                collect_appearances(idx, &lines[idx], body_start, Some(&id), &mut set.nested);
                for cont in region.lines.start + 1..region.lines.end {
                    collect_appearances(cont, &lines[cont], 0, Some(&id), &mut set.nested);
                }

                set.definitions.push(ReferenceDefinition {
                    position: Position::in_line(idx, first, raw_span.start - 2),
                    body_text: definition_body(&lines, region.lines.clone(), body_start),
                    id,
                    raw_span,
                    lines: region.lines,
                });
            }
            RegionKind::FencedCode | RegionKind::FrontMatter => {}
        }
    }

    log::debug!(
        "{}: {} appearances, {} definitions",
        doc.path.display(),
        set.appearances.len(),
        set.definitions.len()
    );

    Ok(set)
}

/// Report orphans, unused and empty definitions and the would-be renumbering
pub fn check(doc: &Document) -> Result<ReferenceReport> {
    let set = analyze(doc)?;
    Ok(ReferenceReport {
        orphans: set.orphans(),
        unused: set.unused().into_iter().cloned().collect(),
        empty: set
            .definitions
            .iter()
            .filter(|d| d.body_text.is_empty())
            .cloned()
            .collect(),
        renumbering: set.renumbering(),
    })
}

/// Remove unused definitions and renumber the rest by first appearance.
///
/// Nothing is rewritten when the document has a duplicate definition.
pub fn fix(doc: &Document) -> Result<ReferenceFix> {
    let set = analyze(doc)?;
    let lines = doc.lines();

    let renumbered: Vec<Renumbering> = set
        .renumbering()
        .into_iter()
        .filter(|r| !r.is_identity())
        .collect();
    let new_ids: HashMap<&str, &str> = renumbered
        .iter()
        .map(|r| (r.old.as_str(), r.new.as_str()))
        .collect();

    let mut removed_lines = vec![false; lines.len()];
    let mut removed = Vec::new();
    for def in set.unused() {
        removed_lines[def.lines.clone()].fill(true);
        removed.push(def.id.clone());
    }

    let mut edits: HashMap<usize, Vec<(Range<usize>, &str)>> = HashMap::new();
    let appearance_sites = set
        .appearances
        .iter()
        .chain(&set.nested)
        .map(|a| (&a.id, a.position.line - 1, &a.raw_span));
    let definition_sites = set
        .definitions
        .iter()
        .map(|d| (&d.id, d.lines.start, &d.raw_span));
    for (id, line_idx, span) in appearance_sites.chain(definition_sites) {
        if let Some(new) = new_ids.get(id.as_str()) {
            edits.entry(line_idx).or_default().push((span.clone(), *new));
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut after_removal = false;
    let mut last_blank = true;
    for (idx, line) in lines.iter().enumerate() {
        if removed_lines[idx] {
            after_removal = true;
            continue;
        }
        let blank = scanner::is_blank(line);
        if blank && after_removal && last_blank {
            continue;
        }
        if !blank {
            after_removal = false;
        }
        last_blank = blank;
        out.push(match edits.get_mut(&idx) {
            Some(line_edits) => apply_edits(line, line_edits),
            None => line.clone(),
        });
    }
    if after_removal {
        while out.last().is_some_and(|l| scanner::is_blank(l)) {
            out.pop();
        }
    }

    let content = out.concat();
    let changed = doc.rope != content.as_str();

    log::debug!(
        "{}: renumbered {}, removed {}",
        doc.path.display(),
        renumbered.len(),
        removed.len()
    );

    Ok(ReferenceFix {
        content,
        changed,
        renumbered,
        removed,
        orphans: set.orphans(),
    })
}

/// Citations in one line, starting the search at byte `from`
fn collect_appearances(
    line_idx: usize,
    raw_line: &str,
    from: usize,
    in_definition: Option<&str>,
    out: &mut Vec<Appearance>,
) {
    let line = scanner::strip_line_ending(raw_line);
    if from > line.len() {
        return;
    }
    let code_spans = scanner::inline_code_spans(line);

    for m in RE_APPEARANCE.find_iter(&line[from..]) {
        let start = from + m.start();
        let id = start + 2..from + m.end() - 1;
        if code_spans.iter().any(|span| span.contains(&start)) {
            continue;
        }
        out.push(Appearance {
            id: line[id.clone()].to_string(),
            position: Position::in_line(line_idx, line, start),
            raw_span: id,
            in_definition: in_definition.map(str::to_string),
        });
    }
}

/// Definition text after `]:` on the first line plus continuation lines
fn definition_body(lines: &[String], range: Range<usize>, body_start: usize) -> String {
    let first = scanner::strip_line_ending(&lines[range.start]);
    let mut body = first[body_start..].trim_start().to_string();
    for line in &lines[range.start + 1..range.end] {
        body.push('\n');
        body.push_str(scanner::strip_line_ending(line));
    }
    body.trim_end().to_string()
}

fn apply_edits(line: &str, edits: &mut [(Range<usize>, &str)]) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut result = String::with_capacity(line.len());
    let mut cursor = 0;
    for (span, replacement) in edits.iter() {
        result.push_str(&line[cursor..span.start]);
        result.push_str(replacement);
        cursor = span.end;
    }
    result.push_str(&line[cursor..]);
    result
}
