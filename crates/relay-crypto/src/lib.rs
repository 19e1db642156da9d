//! Credentials for the chain adapter.
//!
//! The ledger authenticates a block subscription by account id plus an
//! Ed25519 signature over the request. This crate wraps `ed25519-dalek` and
//! loads key pairs from the `<account>.priv` / `<account>.pub` hex files that
//! ledger tooling produces. No custom cryptography.

pub mod error;
pub mod keys;
pub mod signer;

pub use error::{CryptoError, CryptoResult};
pub use keys::KeyPair;
pub use signer::{Signature, SigningKey, VerifyingKey};
