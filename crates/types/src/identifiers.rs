//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Block height as reported by the host ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Genesis block height.
    pub const GENESIS: Self = BlockHeight(0);

    /// Get the next block height (saturates at `u64::MAX`).
    pub fn next(self) -> Self {
        BlockHeight(self.0.saturating_add(1))
    }

    /// Get the previous block height (returns None if at genesis).
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(BlockHeight(self.0 - 1))
        } else {
            None
        }
    }

    /// Number of blocks from `earlier` up to `self` (zero if `earlier` is later).
    pub fn since(self, earlier: BlockHeight) -> BlockCount {
        BlockCount(self.0.saturating_sub(earlier.0))
    }
}

impl Add<BlockCount> for BlockHeight {
    type Output = BlockHeight;

    /// Saturates at `u64::MAX` so a huge delay reads as "never".
    fn add(self, rhs: BlockCount) -> Self::Output {
        BlockHeight(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// A span of blocks (exit delays, epoch durations, proposal lifetimes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockCount(pub u64);

impl fmt::Display for BlockCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks", self.0)
    }
}

/// External identifier of a piece of misbehavior evidence.
///
/// Usually the id of the transaction a bundler failed to deliver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(pub String);

impl EvidenceId {
    /// Create an evidence id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EvidenceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
