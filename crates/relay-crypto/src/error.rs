use std::path::PathBuf;

/// Errors from signing and key handling.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key")]
    InvalidKey,

    #[error("invalid hex in {path}: {reason}")]
    InvalidHex { path: PathBuf, reason: String },

    #[error("public key in {path} does not match the private key")]
    KeyMismatch { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
