use std::path::PathBuf;

use relay_types::BlockHeight;

/// Errors from checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The persisted value exists but is not a decimal height.
    #[error("corrupt checkpoint in {path}: {content:?}")]
    Corrupt { path: PathBuf, content: String },

    /// I/O error from the underlying storage.
    #[error("checkpoint I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write was refused by the backend.
    #[error("checkpoint write of height {height} refused: {reason}")]
    WriteRefused { height: BlockHeight, reason: String },
}

/// Result alias for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;
