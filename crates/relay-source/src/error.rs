use thiserror::Error;

use relay_crypto::CryptoError;
use relay_protocol::ProtocolError;
use relay_types::BlockHeight;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The ledger is unreachable or the subscription dropped.
    #[error("ledger connection lost: {0}")]
    ConnectionLost(String),

    /// The ledger ended the stream with an error frame.
    #[error("ledger error {code}: {message}")]
    Remote { code: u32, message: String },

    /// A delivered block is not the direct successor of the previous one.
    #[error("stream ordering violation: expected height {expected}, got {actual}")]
    OrderingViolation {
        expected: BlockHeight,
        actual: BlockHeight,
    },

    #[error("unexpected {0} frame on block stream")]
    UnexpectedMessage(&'static str),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("credentials error: {0}")]
    Credentials(#[from] CryptoError),

    /// The stream already failed; open a new one.
    #[error("block stream already terminated")]
    Terminated,
}

pub type SourceResult<T> = Result<T, SourceError>;
