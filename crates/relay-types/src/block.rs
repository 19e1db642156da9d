use std::fmt;

use serde::{Deserialize, Serialize};

use crate::height::BlockHeight;

/// BLAKE3 digest of a block payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Hash a serialized block payload.
    pub fn of(payload: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"relay-block-v1:");
        hasher.update(payload);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One unit of the ledger's sequence.
///
/// The payload is the ledger's own serialization of the block and is never
/// interpreted by the adapter; it is republished byte-for-byte. The height is
/// extracted by the ledger node and is the sole source of truth for ordering.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: BlockHeight,
    pub payload: Vec<u8>,
}

impl Block {
    pub fn new(height: BlockHeight, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            height,
            payload: payload.into(),
        }
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::of(&self.payload)
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("height", &self.height.get())
            .field("hash", &self.hash())
            .field("len", &self.payload.len())
            .finish()
    }
}
