//! OAT Core - learning diary Markdown maintenance
//!
//! This crate contains the logic behind the `oat` command, independent of
//! any command-line concerns:
//! - Document model with Rope-based text storage and atomic rewrites
//! - Line region classification (code, footnote definitions, prose)
//! - Footnote reference reconciliation and renumbering
//! - Image caption numbering
//! - Prose word counting
//! - Configuration management

pub mod batch;
pub mod captions;
pub mod config;
pub mod diff;
pub mod doc;
pub mod error;
pub mod front_matter;
pub mod references;
pub mod scanner;
pub mod wordcount;

// Re-export commonly used types
pub use config::Config;
pub use doc::Document;
pub use error::{Error, Result};
