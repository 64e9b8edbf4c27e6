use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The folder could not be listed (missing, not a directory, or unreadable).
    #[error("image folder unavailable: {}", .0.display())]
    FolderUnavailable(PathBuf),

    /// Navigation was requested on a collection with no items.
    #[error("collection is empty")]
    CollectionEmpty,

    /// There is no current item to dereference.
    #[error("no current item")]
    NoCurrentItem,

    /// The last item was removed; the session has nothing left to show.
    #[error("collection exhausted")]
    CollectionExhausted,

    /// Slide interval outside of the accepted range.
    #[error("interval must be between {min} and {max} ms (got {got})")]
    InvalidInterval { got: u64, min: u64, max: u64 },

    /// Trash or copy operation failed.
    #[error(transparent)]
    Relocate(#[from] RelocateError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON settings (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML settings (de)serialization error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure reported by a [`crate::relocate::Relocator`].
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("destination folder does not exist: {}", .0.display())]
    MissingDestination(PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Trash(#[from] trash::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
