//! Ordered block subscription for the chain adapter.
//!
//! A [`BlockSource`] opens a [`BlockStream`] of every block after a given
//! height. Streams are strictly ordered and contiguous: each delivered block
//! is exactly one above the previous one. Anything else (a gap, a replay, a
//! disconnect, a remote close) ends the stream with an error. Nothing is
//! retried here; the caller decides what a dead stream means.
//!
//! Every stream is fed by a single producer task through a channel of
//! capacity one, so deliveries are serialized regardless of what the
//! transport does underneath.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod stream;
pub mod traits;

pub use error::{SourceError, SourceResult};
pub use ledger::{LedgerBlockSource, LedgerConfig};
pub use memory::{OpenLog, ScriptTail, ScriptedBlockSource};
pub use stream::{BlockSink, BlockStream, DELIVERY_CAPACITY};
pub use traits::BlockSource;
