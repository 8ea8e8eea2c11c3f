//! File-scoped error taxonomy

use std::path::PathBuf;

/// Conditions that stop one file from being checked or rewritten.
///
/// Every variant is scoped to a single file; callers processing many files
/// record the error and move on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("footnote [^{id}] is defined twice (lines {first_line} and {second_line})")]
    DuplicateDefinition {
        id: String,
        first_line: usize,
        second_line: usize,
    },

    #[error("{} changed on disk after it was read, not overwriting", path.display())]
    ModifiedOnDisk { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
