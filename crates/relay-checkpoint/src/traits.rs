use relay_types::BlockHeight;

use crate::error::CheckpointResult;

/// Durable single-value store of the last fully processed block height.
///
/// All implementations must satisfy these invariants:
/// - `get()` returns `BlockHeight::ZERO` when nothing was ever stored.
/// - After `set(h)` returns `Ok`, every later `get()` returns `h`, including
///   after a process crash.
/// - Calls are mutually exclusive; a reader never observes a partial write.
/// - The store does not enforce monotonicity. The caller only ever moves the
///   value forward.
pub trait CheckpointStore: Send + Sync {
    /// Read the last persisted height.
    fn get(&self) -> CheckpointResult<BlockHeight>;

    /// Persist `height`, replacing any previous value.
    fn set(&self, height: BlockHeight) -> CheckpointResult<()>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for std::sync::Arc<T> {
    fn get(&self) -> CheckpointResult<BlockHeight> {
        (**self).get()
    }

    fn set(&self, height: BlockHeight) -> CheckpointResult<()> {
        (**self).set(height)
    }
}
