//! Document model with Rope-based text storage

use ropey::Rope;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};

/// One Markdown file loaded into memory
#[derive(Clone, Debug)]
pub struct Document {
    pub path: PathBuf,
    pub rope: Rope,
    pub loaded_mtime: Option<SystemTime>,
}

impl Document {
    /// Load a document from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded_mtime = fs::metadata(path).and_then(|m| m.modified()).ok();

        Ok(Self {
            path: path.to_path_buf(),
            rope: Rope::from_str(&content),
            loaded_mtime,
        })
    }

    /// Build a document from in-memory text, not backed by a file
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            rope: Rope::from_str(text),
            loaded_mtime: None,
        }
    }

    /// Full document text
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Lines of the document, each with its original line terminator.
    ///
    /// Only `\n` ends a line. Concatenating the result reproduces the
    /// document byte for byte.
    pub fn lines(&self) -> Vec<String> {
        self.text().split_inclusive('\n').map(str::to_string).collect()
    }

    /// Whether the file on disk was modified after this document was loaded
    pub fn is_stale(&self) -> bool {
        let Some(loaded) = self.loaded_mtime else {
            return false;
        };
        match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(current) => current != loaded,
            Err(_) => true,
        }
    }

    /// Replace the file's content with `new_content`.
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is renamed over the target, so the file is either fully old or fully
    /// new. Returns `false` without touching the file when nothing changed.
    pub fn persist(&self, new_content: &str) -> Result<bool> {
        if self.rope == new_content {
            return Ok(false);
        }

        if self.is_stale() {
            return Err(Error::ModifiedOnDisk {
                path: self.path.clone(),
            });
        }

        let write_failed = |source: std::io::Error| Error::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(new_content.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), metadata.permissions()).map_err(write_failed)?;
        }

        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;

        log::info!("rewrote {}", self.path.display());
        Ok(true)
    }
}
