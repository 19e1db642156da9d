//! Foundation types for the chain adapter.
//!
//! Every other `relay-*` crate depends on `relay-types`.
//!
//! # Key Types
//!
//! - [`BlockHeight`] -- position of a block in the ledger's append-only sequence
//! - [`Block`] -- opaque serialized block payload tagged with its height
//! - [`BlockHash`] -- BLAKE3 digest of a block payload
//! - [`AccountId`] -- `name@domain` ledger identity used to authenticate

pub mod account;
pub mod block;
pub mod error;
pub mod height;

pub use account::AccountId;
pub use block::{Block, BlockHash};
pub use error::TypeError;
pub use height::BlockHeight;
