use std::time::Duration;

use thiserror::Error;

use relay_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker is unreachable or the connection dropped.
    #[error("broker connection lost: {0}")]
    ConnectionLost(String),

    /// The broker refused the message.
    #[error("broker rejected block {height}: {reason}")]
    Rejected { height: u64, reason: String },

    /// No confirmation arrived in time.
    #[error("broker did not confirm within {0:?}")]
    Timeout(Duration),

    #[error("broker protocol error: {0}")]
    Protocol(String),

    #[error("invalid broker configuration: {0}")]
    Config(String),
}

impl From<ProtocolError> for PublishError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Io(io) => Self::ConnectionLost(io.to_string()),
            other => Self::Protocol(other.to_string()),
        }
    }
}

pub type PublishResult<T> = Result<T, PublishError>;
