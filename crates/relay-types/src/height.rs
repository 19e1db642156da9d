use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Position of a block in the ledger's append-only sequence.
///
/// Height `0` is reserved for "nothing processed yet": the first block a
/// ledger produces has height `1`. Heights increase by exactly one per block,
/// which is what lets the adapter detect gaps and replays.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// The height before any block has been processed.
    pub const ZERO: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// The raw height value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` if no block has been processed at this height.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The height that must immediately follow this one.
    ///
    /// Saturates at `u64::MAX`; a ledger never gets there.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns `true` if `other` is the direct successor of `self`.
    pub fn is_followed_by(self, other: Self) -> bool {
        self.0.checked_add(1) == Some(other.0)
    }
}

impl fmt::Debug for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHeight({})", self.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses the decimal representation, ignoring surrounding whitespace.
impl FromStr for BlockHeight {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidHeight(s.to_string()))
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl From<BlockHeight> for u64 {
    fn from(height: BlockHeight) -> Self {
        height.0
    }
}
