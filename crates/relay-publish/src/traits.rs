use async_trait::async_trait;
use relay_types::Block;

use crate::error::PublishResult;

/// Output boundary: delivers a block's payload to the broker.
///
/// `Ok(())` means the broker has taken responsibility for the message.
/// Any error means it may not have; the caller must not advance past the
/// block.
#[async_trait]
pub trait Republisher: Send + Sync {
    async fn publish(&self, block: &Block) -> PublishResult<()>;
}

#[async_trait]
impl<P: Republisher + ?Sized> Republisher for std::sync::Arc<P> {
    async fn publish(&self, block: &Block) -> PublishResult<()> {
        (**self).publish(block).await
    }
}
