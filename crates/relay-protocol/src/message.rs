use serde::{Deserialize, Serialize};
use uuid::Uuid;

use relay_types::{Block, BlockHeight};

use crate::auth::SubscribeRequest;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// All message types exchanged by the adapter.
///
/// `Subscribe` and `Block` travel on the ledger connection; `Publish`,
/// `PublishAck` and `PublishNack` on the broker connection. `Error` may be
/// sent by either peer and always ends the conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RelayMessage {
    Subscribe(SubscribeRequest),
    Block {
        height: BlockHeight,
        payload: Vec<u8>,
    },
    Publish {
        message_id: Uuid,
        exchange: String,
        routing_key: String,
        height: BlockHeight,
        payload: Vec<u8>,
    },
    PublishAck {
        message_id: Uuid,
    },
    PublishNack {
        message_id: Uuid,
        reason: String,
    },
    Error {
        code: u32,
        message: String,
    },
}

impl RelayMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Subscribe(_) => 1,
            Self::Block { .. } => 2,
            Self::Publish { .. } => 3,
            Self::PublishAck { .. } => 4,
            Self::PublishNack { .. } => 5,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "Subscribe",
            Self::Block { .. } => "Block",
            Self::Publish { .. } => "Publish",
            Self::PublishAck { .. } => "PublishAck",
            Self::PublishNack { .. } => "PublishNack",
            Self::Error { .. } => "Error",
        }
    }

    pub fn block(block: &Block) -> Self {
        Self::Block {
            height: block.height,
            payload: block.payload.clone(),
        }
    }
}

pub mod error_codes {
    /// The account may not read blocks.
    pub const FORBIDDEN: u32 = 403;
}
