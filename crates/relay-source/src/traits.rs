use async_trait::async_trait;
use relay_types::BlockHeight;

use crate::error::SourceResult;
use crate::stream::BlockStream;

/// Subscription boundary to a ledger node.
///
/// `open` starts a fresh subscription that yields every block with height
/// greater than `after`, starting at `after + 1`. A stream is not
/// restartable: once it fails, call `open` again. Opening a new stream ends
/// any stream previously opened from the same source, so at most one
/// subscription is live per source.
#[async_trait]
pub trait BlockSource: Send {
    async fn open(&mut self, after: BlockHeight) -> SourceResult<BlockStream>;
}

#[async_trait]
impl<S: BlockSource + ?Sized> BlockSource for Box<S> {
    async fn open(&mut self, after: BlockHeight) -> SourceResult<BlockStream> {
        (**self).open(after).await
    }
}
