use std::fmt;

use thiserror::Error;

use relay_checkpoint::CheckpointError;
use relay_publish::PublishError;
use relay_source::SourceError;
use relay_types::BlockHeight;

use crate::config::ConfigError;

/// Exit code for failures before the supervisor starts.
pub const BOOTSTRAP_EXIT_CODE: i32 = 1;

/// The four ways a run can end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionLost,
    StreamOrderingViolation,
    PublishFailure,
    CheckpointIoFailure,
}

impl ErrorKind {
    /// Process exit code reported for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::ConnectionLost => 10,
            ErrorKind::StreamOrderingViolation => 11,
            ErrorKind::PublishFailure => 12,
            ErrorKind::CheckpointIoFailure => 13,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::ConnectionLost => "ConnectionLost",
            ErrorKind::StreamOrderingViolation => "StreamOrderingViolation",
            ErrorKind::PublishFailure => "PublishFailure",
            ErrorKind::CheckpointIoFailure => "CheckpointIoFailure",
        })
    }
}

/// Terminal error of a supervisor run. Every variant is fatal.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The block subscription failed or dropped.
    #[error("ledger subscription failed: {0}")]
    ConnectionLost(#[source] SourceError),

    /// A delivered block was not the successor of the last relayed one.
    #[error("stream ordering violation: expected height {expected}, got {actual}")]
    StreamOrderingViolation {
        expected: BlockHeight,
        actual: BlockHeight,
    },

    #[error("publishing block {height} failed: {source}")]
    PublishFailure {
        height: BlockHeight,
        #[source]
        source: PublishError,
    },

    #[error("checkpoint I/O failure: {0}")]
    CheckpointIoFailure(#[from] CheckpointError),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::ConnectionLost(_) => ErrorKind::ConnectionLost,
            AdapterError::StreamOrderingViolation { .. } => ErrorKind::StreamOrderingViolation,
            AdapterError::PublishFailure { .. } => ErrorKind::PublishFailure,
            AdapterError::CheckpointIoFailure(_) => ErrorKind::CheckpointIoFailure,
        }
    }
}

impl From<SourceError> for AdapterError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::OrderingViolation { expected, actual } => {
                AdapterError::StreamOrderingViolation { expected, actual }
            }
            other => AdapterError::ConnectionLost(other),
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failure while assembling the live collaborators.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("ledger source setup failed: {0}")]
    Source(#[from] SourceError),

    #[error("broker setup failed: {0}")]
    Publish(#[from] PublishError),

    #[error("checkpoint setup failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl BootstrapError {
    /// An unreachable broker or an unusable checkpoint location at startup
    /// reports the same code as the matching runtime failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::Publish(PublishError::Config(_)) => BOOTSTRAP_EXIT_CODE,
            BootstrapError::Publish(_) => ErrorKind::PublishFailure.exit_code(),
            BootstrapError::Checkpoint(_) => ErrorKind::CheckpointIoFailure.exit_code(),
            BootstrapError::Config(_) | BootstrapError::Source(_) => BOOTSTRAP_EXIT_CODE,
        }
    }
}
