use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use relay_types::{Block, BlockHeight};

use crate::error::{SourceError, SourceResult};

/// Blocks buffered between the producer task and the consumer.
///
/// One means the producer cannot run ahead of the consumer by more than a
/// single block.
pub const DELIVERY_CAPACITY: usize = 1;

type Delivery = SourceResult<Block>;

/// Producer half of a [`BlockStream`].
///
/// Owned by exactly one task; `deliver` waits until the consumer has room, so
/// blocks reach the consumer one at a time and in the order they were sent.
pub struct BlockSink {
    tx: mpsc::Sender<Delivery>,
}

impl BlockSink {
    /// Hand a block to the consumer. Returns `false` once the consumer is gone.
    pub async fn deliver(&self, block: Block) -> bool {
        self.tx.send(Ok(block)).await.is_ok()
    }

    /// End the stream with `error`.
    pub async fn fail(self, error: SourceError) {
        let _ = self.tx.send(Err(error)).await;
    }
}

/// Ordered, contiguous stream of blocks from one subscription.
///
/// Validates every delivery against the expected next height. The first
/// error of any kind is terminal: the producer task is aborted and all later
/// calls to [`next`](Self::next) return [`SourceError::Terminated`].
pub struct BlockStream {
    deliveries: mpsc::Receiver<Delivery>,
    last: BlockHeight,
    producer: Option<JoinHandle<()>>,
    terminated: bool,
}

impl BlockStream {
    /// Create a linked sink and stream for a subscription after `after`.
    pub fn channel(after: BlockHeight) -> (BlockSink, BlockStream) {
        let (tx, rx) = mpsc::channel(DELIVERY_CAPACITY);
        let stream = BlockStream {
            deliveries: rx,
            last: after,
            producer: None,
            terminated: false,
        };
        (BlockSink { tx }, stream)
    }

    /// Tie the producer task's lifetime to this stream.
    pub fn attach(mut self, producer: JoinHandle<()>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Height of the last block handed out, or the opening height.
    pub fn last(&self) -> BlockHeight {
        self.last
    }

    /// Height the next block must have.
    pub fn expected(&self) -> BlockHeight {
        self.last.next()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Wait for the next block.
    pub async fn next(&mut self) -> SourceResult<Block> {
        if self.terminated {
            return Err(SourceError::Terminated);
        }
        let result = match self.deliveries.recv().await {
            None => Err(SourceError::ConnectionLost(
                "block stream closed without an error".into(),
            )),
            Some(Err(e)) => Err(e),
            Some(Ok(block)) if !self.last.is_followed_by(block.height) => {
                Err(SourceError::OrderingViolation {
                    expected: self.expected(),
                    actual: block.height,
                })
            }
            Some(Ok(block)) => {
                trace!(height = %block.height, "block delivered");
                self.last = block.height;
                Ok(block)
            }
        };
        if result.is_err() {
            self.terminate();
        }
        result
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.deliveries.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl Drop for BlockStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl std::fmt::Debug for BlockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStream")
            .field("last", &self.last)
            .field("terminated", &self.terminated)
            .finish()
    }
}
