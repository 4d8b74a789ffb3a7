// Error types for the playlist core
// Recoverable per-path problems are logged and skipped by the builder, the rest bubble up

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlaylistError>;

#[derive(Error, Debug)]
pub enum PlaylistError {
    /// Path does not point at an existing regular file
    #[error("'{}' rejected: {reason}", path.display())]
    PathRejected { path: PathBuf, reason: String },

    /// Save document is missing required keys or has the wrong shape
    #[error("malformed playlist save file '{}': {reason}", path.display())]
    MalformedSaveDocument { path: PathBuf, reason: String },

    /// A save file ended up expanding itself again
    #[error("playlist save file '{}' references itself through its own entries", path.display())]
    SaveFileCycle { path: PathBuf },

    #[error("playlist save files nested deeper than {limit} levels at '{}'", path.display())]
    NestingTooDeep { path: PathBuf, limit: usize },

    /// Cursor index outside 0..=len
    #[error("index {index} out of range (playlist has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlaylistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedSaveDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the errors that mean "this save file can't be expanded"
    pub fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            Self::MalformedSaveDocument { .. } | Self::SaveFileCycle { .. } | Self::NestingTooDeep { .. }
        )
    }
}
