use std::sync::Mutex;

use async_trait::async_trait;

use relay_types::{Block, BlockHeight};

use crate::error::{PublishError, PublishResult};
use crate::traits::Republisher;

#[derive(Default)]
struct Recorded {
    blocks: Vec<Block>,
    reject_at: Option<BlockHeight>,
}

/// Publisher that keeps every block in memory instead of sending it.
///
/// Intended for tests and embedding. Can be told to reject one height to
/// stand in for a broker refusing a message.
#[derive(Default)]
pub struct RecordingPublisher {
    inner: Mutex<Recorded>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accepted block, in publish order.
    pub fn published(&self) -> Vec<Block> {
        self.inner.lock().expect("lock poisoned").blocks.clone()
    }

    pub fn heights(&self) -> Vec<BlockHeight> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .blocks
            .iter()
            .map(|b| b.height)
            .collect()
    }

    /// Reject the block at `height`.
    pub fn reject_at(&self, height: BlockHeight) {
        self.inner.lock().expect("lock poisoned").reject_at = Some(height);
    }
}

#[async_trait]
impl Republisher for RecordingPublisher {
    async fn publish(&self, block: &Block) -> PublishResult<()> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.reject_at == Some(block.height) {
            return Err(PublishError::Rejected {
                height: block.height.get(),
                reason: "rejected by recording publisher".into(),
            });
        }
        inner.blocks.push(block.clone());
        Ok(())
    }
}

impl std::fmt::Debug for RecordingPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("lock poisoned");
        f.debug_struct("RecordingPublisher")
            .field("published", &inner.blocks.len())
            .field("reject_at", &inner.reject_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn block(h: u64) -> Block {
        Block::new(BlockHeight::new(h), vec![h as u8])
    }

    #[tokio::test]
    async fn records_in_order() {
        let publisher = RecordingPublisher::new();
        for h in [1, 2, 3] {
            publisher.publish(&block(h)).await.unwrap();
        }
        assert_eq!(
            publisher.heights(),
            vec![BlockHeight::new(1), BlockHeight::new(2), BlockHeight::new(3)]
        );
        assert_eq!(publisher.published()[1].payload, vec![2]);
    }

    #[tokio::test]
    async fn rejects_configured_height() {
        let publisher = RecordingPublisher::new();
        publisher.reject_at(BlockHeight::new(2));
        publisher.publish(&block(1)).await.unwrap();
        let err = publisher.publish(&block(2)).await.unwrap_err();
        assert!(matches!(err, PublishError::Rejected { height: 2, .. }));
        assert_eq!(publisher.heights(), vec![BlockHeight::new(1)]);
    }

    #[tokio::test]
    async fn usable_through_arc() {
        let publisher = Arc::new(RecordingPublisher::new());
        let shared: Arc<dyn Republisher> = publisher.clone();
        shared.publish(&block(7)).await.unwrap();
        assert_eq!(publisher.heights(), vec![BlockHeight::new(7)]);
    }
}
