use std::sync::Mutex;

use relay_types::BlockHeight;

use crate::error::{CheckpointError, CheckpointResult};
use crate::traits::CheckpointStore;

#[derive(Default)]
struct MemoryState {
    height: BlockHeight,
    history: Vec<BlockHeight>,
    refuse_from: Option<BlockHeight>,
}

/// In-memory checkpoint store.
///
/// Intended for tests and embedding. Keeps every successful write in order so
/// callers can assert on the exact sequence of checkpoints, and can be told
/// to refuse writes from a given height on to simulate a failing disk.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    state: Mutex<MemoryState>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing checkpoint, as if restored from disk.
    pub fn with_height(height: BlockHeight) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                height,
                ..Default::default()
            }),
        }
    }

    /// Every successful `set`, oldest first.
    pub fn history(&self) -> Vec<BlockHeight> {
        self.state.lock().expect("lock poisoned").history.clone()
    }

    /// Refuse every write of `height` or above.
    pub fn refuse_from(&self, height: BlockHeight) {
        self.state.lock().expect("lock poisoned").refuse_from = Some(height);
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn get(&self) -> CheckpointResult<BlockHeight> {
        Ok(self.state.lock().expect("lock poisoned").height)
    }

    fn set(&self, height: BlockHeight) -> CheckpointResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.refuse_from.is_some_and(|limit| height >= limit) {
            return Err(CheckpointError::WriteRefused {
                height,
                reason: "write refused by test store".into(),
            });
        }
        state.height = height;
        state.history.push(height);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("lock poisoned");
        f.debug_struct("InMemoryCheckpointStore")
            .field("height", &state.height)
            .field("writes", &state.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(InMemoryCheckpointStore::new().get().unwrap(), BlockHeight::ZERO);
    }

    #[test]
    fn with_height_restores() {
        let store = InMemoryCheckpointStore::with_height(BlockHeight::new(10));
        assert_eq!(store.get().unwrap(), BlockHeight::new(10));
        assert!(store.history().is_empty());
    }

    #[test]
    fn history_records_writes() {
        let store = InMemoryCheckpointStore::new();
        store.set(BlockHeight::new(1)).unwrap();
        store.set(BlockHeight::new(2)).unwrap();
        assert_eq!(store.history(), vec![BlockHeight::new(1), BlockHeight::new(2)]);
        assert_eq!(store.get().unwrap(), BlockHeight::new(2));
    }

    #[test]
    fn refused_write_keeps_previous_value() {
        let store = InMemoryCheckpointStore::new();
        store.refuse_from(BlockHeight::new(3));
        store.set(BlockHeight::new(2)).unwrap();
        let err = store.set(BlockHeight::new(3)).unwrap_err();
        assert!(matches!(err, CheckpointError::WriteRefused { .. }));
        assert_eq!(store.get().unwrap(), BlockHeight::new(2));
        assert_eq!(store.history(), vec![BlockHeight::new(2)]);
    }

    #[test]
    fn shared_through_arc() {
        let store = std::sync::Arc::new(InMemoryCheckpointStore::new());
        let handle: &dyn CheckpointStore = &store;
        handle.set(BlockHeight::new(4)).unwrap();
        assert_eq!(store.get().unwrap(), BlockHeight::new(4));
    }
}
