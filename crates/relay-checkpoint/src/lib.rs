//! Durable checkpoint storage for the chain adapter.
//!
//! A checkpoint is a single block height: the last block whose publish to the
//! broker succeeded. It is read once at startup and overwritten after every
//! relayed block.
//!
//! # Storage Backends
//!
//! All backends implement the [`CheckpointStore`] trait:
//!
//! - [`FileCheckpointStore`] -- one decimal height in a text file, replaced atomically
//! - [`InMemoryCheckpointStore`] -- mutex-guarded value for tests and embedding
//!
//! # Design Rules
//!
//! 1. Absent or empty state reads as height 0.
//! 2. Writes are unconditional overwrites; the caller keeps them monotonic.
//! 3. Every read and write is serialized behind a lock.
//! 4. A crash mid-write leaves the previous value readable.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{CheckpointError, CheckpointResult};
pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;
pub use traits::CheckpointStore;
