use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid block height: {0:?}")]
    InvalidHeight(String),

    #[error("invalid account id {id:?}: {reason}")]
    InvalidAccountId { id: String, reason: &'static str },
}
