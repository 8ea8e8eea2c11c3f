//! OAT - keeps learning diary Markdown files tidy

mod commands;
mod files;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use files::expand_inputs;
use oat_core::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Footnote, caption and word count maintenance for learning diaries
#[derive(Parser, Debug)]
#[command(name = "oat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check or fix `[^id]` footnote references
    References {
        #[command(subcommand)]
        action: Action,
    },
    /// Check or fix `**Kuva N**:` image caption numbering
    Captions {
        #[command(subcommand)]
        action: Action,
    },
    /// Count words in prose, skipping code, footnote definitions and URLs
    Wordcount {
        /// Markdown files, directories or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Report problems without touching the files
    Check {
        /// Markdown files, directories or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
    /// Rewrite the files in place.
    ///
    /// Exits with status 1 when a file could not be fixed, or when orphan
    /// references or malformed captions are left for manual repair.
    Fix {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Markdown files, directories or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = load_config(args.config.as_ref())?;

    let ok = match args.command {
        Command::References { action } => match action {
            Action::Check { files } => commands::references_check(&expand_inputs(&files)?, &config),
            Action::Fix { dry_run, files } => {
                commands::references_fix(&expand_inputs(&files)?, dry_run, &config)
            }
        },
        Command::Captions { action } => match action {
            Action::Check { files } => commands::captions_check(&expand_inputs(&files)?, &config),
            Action::Fix { dry_run, files } => {
                commands::captions_fix(&expand_inputs(&files)?, dry_run, &config)
            }
        },
        Command::Wordcount { files } => commands::wordcount(&expand_inputs(&files)?),
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
