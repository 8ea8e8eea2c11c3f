//! Subcommand runners
//!
//! Every runner loads its files through [`batch::run`], prints a report to
//! stdout and returns whether the run succeeded. Per-file errors go to stderr
//! and never stop the remaining files.

use std::path::{Path, PathBuf};

use oat_core::batch::{self, FileOutcome};
use oat_core::captions::{self, MalformedCaption};
use oat_core::references;
use oat_core::{diff, wordcount, Config, Document};

use crate::output::Table;

/// A rewrite computed for one file, with its diff when one was asked for
struct Applied<T> {
    fix: T,
    diff: String,
    /// Lines removed and added
    changes: (usize, usize),
}

/// Produce the diff preview and, unless this is a dry run, write `new` to disk
fn write_out(doc: &Document, new: &str, dry_run: bool, config: &Config) -> oat_core::Result<String> {
    let diff = if dry_run || config.fix.show_diff {
        diff::unified(&doc.path, &doc.text(), new)
    } else {
        String::new()
    };
    if !dry_run {
        doc.persist(new)?;
    }
    Ok(diff)
}

fn report_errors<T>(outcomes: &[FileOutcome<T>]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        if let Err(e) = &outcome.result {
            eprintln!("❌ {}: {e}", outcome.path.display());
            failed += 1;
        }
    }
    failed
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

pub fn references_check(files: &[PathBuf], config: &Config) -> bool {
    let outcomes = batch::run(files, references::check);

    let mut orphans = Table::new(&["File", "Reference", "Cited at"]);
    let mut unused = Table::new(&["File", "Line", "Definition"]);
    let mut empty = Table::new(&["File", "Line", "Definition"]);
    let mut order = Table::new(&["File", "Current", "Expected"]);
    let mut dirty = 0;

    for outcome in &outcomes {
        let Ok(report) = &outcome.result else {
            continue;
        };
        let path = display(&outcome.path);
        if report.is_clean() {
            if config.report.show_clean {
                println!("✅ {path}: references are in order");
            }
            continue;
        }
        dirty += 1;

        for orphan in &report.orphans {
            let cited: Vec<String> = orphan.positions.iter().map(|p| p.to_string()).collect();
            orphans.push(vec![path.clone(), format!("[^{}]", orphan.id), cited.join(", ")]);
        }
        for def in &report.unused {
            unused.push(vec![path.clone(), def.position.line.to_string(), format!("[^{}]", def.id)]);
        }
        for def in &report.empty {
            empty.push(vec![path.clone(), def.position.line.to_string(), format!("[^{}]", def.id)]);
        }
        for step in report.renumbering.iter().filter(|r| !r.is_identity()) {
            order.push(vec![path.clone(), format!("[^{}]", step.old), format!("[^{}]", step.new)]);
        }
    }

    for (title, table) in [
        ("Orphan references (no definition):", &orphans),
        ("Unused definitions (never cited):", &unused),
        ("Empty definitions:", &empty),
        ("References out of order:", &order),
    ] {
        if !table.is_empty() {
            println!("\n{title}");
            print!("{}", table.render());
        }
    }

    let failed = report_errors(&outcomes);
    failed == 0 && dirty == 0
}

/// Fails when a file could not be fixed or still has orphan references
pub fn references_fix(files: &[PathBuf], dry_run: bool, config: &Config) -> bool {
    let mut unresolved = 0;
    let outcomes = batch::run(files, |doc| {
        let fix = references::fix(doc)?;
        let changes = diff::line_changes(&doc.text(), &fix.content);
        let diff = write_out(doc, &fix.content, dry_run, config)?;
        Ok(Applied { fix, diff, changes })
    });

    for outcome in &outcomes {
        let Ok(applied) = &outcome.result else {
            continue;
        };
        let path = display(&outcome.path);
        let fix = &applied.fix;
        if !fix.orphans.is_empty() {
            unresolved += 1;
        }

        for orphan in &fix.orphans {
            let cited: Vec<String> = orphan.positions.iter().map(|p| p.to_string()).collect();
            println!(
                "⚠️  {path}: [^{}] has no definition (cited at {}), left as is",
                orphan.id,
                cited.join(", ")
            );
        }

        if !fix.changed {
            if config.report.show_clean {
                println!("✅ {path}: no changes needed");
            }
            continue;
        }

        let renumbered = fix.renumbered.iter().filter(|r| !r.is_identity()).count();
        let verb = if dry_run { "would fix" } else { "fixed" };
        let (lines_removed, lines_added) = applied.changes;
        println!(
            "🔧 {path}: {verb} {renumbered} reference(s), removed {} unused definition(s) (-{lines_removed} +{lines_added} lines)",
            fix.removed.len()
        );
        if !applied.diff.is_empty() {
            print!("{}", applied.diff);
        }
    }

    let failed = report_errors(&outcomes);
    failed == 0 && unresolved == 0
}

fn print_malformed(path: &str, malformed: &[MalformedCaption], config: &Config) {
    if malformed.is_empty() {
        return;
    }
    println!("⚠️  {path}: {} malformed caption(s) skipped", malformed.len());
    let mut table = Table::new(&["Line", "Problem", "Content"]);
    for m in malformed {
        table.push(vec![
            m.line.to_string(),
            m.reason.to_string(),
            captions::preview(m.content.trim(), config.report.preview_width),
        ]);
    }
    print!("{}", table.render());
    println!("Correct format: **Kuva #**: Caption text");
    println!("Wrong format:   **Kuva #:**");
}

pub fn captions_check(files: &[PathBuf], config: &Config) -> bool {
    let outcomes = batch::run(files, |doc| Ok(captions::check(doc)));

    let mut issues = Table::new(&["File", "Line", "Current", "Expected", "Text"]);
    let mut dirty = 0;

    for outcome in &outcomes {
        let Ok(report) = &outcome.result else {
            continue;
        };
        let path = display(&outcome.path);
        print_malformed(&path, &report.malformed, config);

        if report.is_clean() {
            if config.report.show_clean {
                println!("✅ {path}: {} caption(s) numbered correctly", report.captions);
            }
            continue;
        }
        dirty += 1;

        for issue in &report.issues {
            let current = if issue.duplicate {
                format!("{} (duplicate)", issue.declared)
            } else {
                issue.declared.to_string()
            };
            issues.push(vec![
                path.clone(),
                issue.line.to_string(),
                current,
                issue.expected.to_string(),
                captions::preview(&issue.text, config.report.preview_width),
            ]);
        }
    }

    if !issues.is_empty() {
        println!("\nCaption numbering issues:");
        print!("{}", issues.render());
    }

    let failed = report_errors(&outcomes);
    failed == 0 && dirty == 0
}

/// Fails when a file could not be fixed or has malformed captions left
pub fn captions_fix(files: &[PathBuf], dry_run: bool, config: &Config) -> bool {
    let mut unresolved = 0;
    let outcomes = batch::run(files, |doc| {
        let fix = captions::fix(doc);
        let changes = diff::line_changes(&doc.text(), &fix.content);
        let diff = write_out(doc, &fix.content, dry_run, config)?;
        Ok(Applied { fix, diff, changes })
    });

    for outcome in &outcomes {
        let Ok(applied) = &outcome.result else {
            continue;
        };
        let path = display(&outcome.path);
        let fix = &applied.fix;
        print_malformed(&path, &fix.malformed, config);
        if !fix.malformed.is_empty() {
            unresolved += 1;
        }

        if !fix.changed {
            if config.report.show_clean {
                println!("✅ {path}: no changes needed");
            }
            continue;
        }

        let verb = if dry_run { "would fix" } else { "fixed" };
        let (lines_removed, lines_added) = applied.changes;
        println!(
            "🔧 {path}: {verb} {} caption(s) (-{lines_removed} +{lines_added} lines)",
            fix.renumbered
        );
        if !applied.diff.is_empty() {
            print!("{}", applied.diff);
        }
    }

    let failed = report_errors(&outcomes);
    failed == 0 && unresolved == 0
}

pub fn wordcount(files: &[PathBuf]) -> bool {
    let outcomes = batch::run(files, |doc| Ok(wordcount::count(doc)));

    let mut table = Table::new(&["File", "Word Count"]);
    let mut total = 0;
    for outcome in &outcomes {
        if let Ok(words) = outcome.result {
            total += words;
            table.push(vec![display(&outcome.path), words.to_string()]);
        }
    }

    if !table.is_empty() {
        table.push(vec!["Total".to_string(), total.to_string()]);
        print!("{}", table.render());
    }

    report_errors(&outcomes) == 0
}
