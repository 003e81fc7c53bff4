//! Error types for marginbox-migrate operations.
//!
//! The migration engine itself never fails (see [`crate::migrate`]); these
//! errors come from the corpus tooling and the CLI around it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, grouping or writing stylesheets.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "cli")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "cli")]
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Attach the offending path to an I/O error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoAt {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
