//! Wire protocol for the chain adapter.
//!
//! Defines the framing, message types, and serialization format used on both
//! of the adapter's connections: the block subscription to the ledger node
//! and the publish channel to the broker.

pub mod auth;
pub mod codec;
pub mod error;
pub mod message;

pub use auth::SubscribeRequest;
pub use codec::RelayCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{error_codes, RelayMessage, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
