//! Error types for the taskindex crate.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that can occur when working with the task index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The stored index cannot be read and must be rebuilt.
    #[error("index is corrupt or missing: {0}")]
    CorruptOrMissing(String),

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// Failed to execute a search.
    #[error("search failed: {0}")]
    Search(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A field name that is not part of the schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A setting outside its permitted range.
    #[error("invalid setting {name}: {message}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The index has been closed.
    #[error("index is closed")]
    Closed,
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `CorruptOrMissing` error from a Tantivy error.
    pub(crate) fn corrupt(source: &tantivy::TantivyError) -> Self {
        Self::CorruptOrMissing(source.to_string())
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Search` error from a Tantivy error.
    pub(crate) fn search(source: &tantivy::TantivyError) -> Self {
        Self::Search(source.to_string())
    }

    /// Whether recovering from this error requires a full rebuild.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptOrMissing(_) | Self::OpenIndex { .. })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn corruption_classification() {
        assert!(IndexError::CorruptOrMissing("meta.json".into()).is_corruption());
        assert!(
            IndexError::OpenIndex {
                path: PathBuf::from("/tmp/idx"),
                message: "bad".into()
            }
            .is_corruption()
        );
        assert!(!IndexError::Write("disk full".into()).is_corruption());
        assert!(!IndexError::Closed.is_corruption());
    }

    #[test]
    fn messages() {
        assert_eq!(
            IndexError::UnknownField("colour".into()).to_string(),
            "unknown field: colour"
        );
        assert_eq!(
            IndexError::InvalidSetting {
                name: "startup_delay",
                message: "must be at most 60000 ms".into()
            }
            .to_string(),
            "invalid setting startup_delay: must be at most 60000 ms"
        );
    }
}
