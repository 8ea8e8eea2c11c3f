//! Running one operation over many files
//!
//! Each file gets its own `Result`. A file that cannot be read or processed
//! is recorded and the remaining files still run.

use std::path::{Path, PathBuf};

use crate::doc::Document;
use crate::error::Result;

#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    pub result: Result<T>,
}

impl<T> FileOutcome<T> {
    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }
}

/// Load every path and apply `op` to the loaded document
pub fn run<T, P, F>(paths: &[P], mut op: F) -> Vec<FileOutcome<T>>
where
    P: AsRef<Path>,
    F: FnMut(&Document) -> Result<T>,
{
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let result = Document::load(path).and_then(|doc| op(&doc));
            if let Err(e) = &result {
                log::debug!("{}: {e}", path.display());
            }
            FileOutcome {
                path: path.to_path_buf(),
                result,
            }
        })
        .collect()
}

/// Number of files whose operation failed
pub fn failures<T>(outcomes: &[FileOutcome<T>]) -> usize {
    outcomes.iter().filter(|o| o.is_err()).count()
}
