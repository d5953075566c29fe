//! Membership records.

use bundlr_types::{Amount, BlockHeight};
use serde::{Deserialize, Serialize};

/// Where an address is in the membership lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitState {
    /// Member with stake locked.
    Active,
    /// Member that called `leave`; may withdraw from the given height on.
    PendingExit(BlockHeight),
    /// Not a member.
    Absent,
}

/// A present (Active or PendingExit) member and its custodied stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member<P> {
    /// Stake held by the pool contract on the member's behalf.
    pub stake: Amount,

    /// `None` while Active, the exit height once leaving.
    pub exit_height: Option<BlockHeight>,

    /// Height of the successful `join`.
    pub joined_at: BlockHeight,

    /// Pool-specific data (e.g. a validator's endpoint).
    pub payload: P,
}

impl<P> Member<P> {
    /// Lifecycle state of this record.
    pub fn exit_state(&self) -> ExitState {
        match self.exit_height {
            None => ExitState::Active,
            Some(height) => ExitState::PendingExit(height),
        }
    }

    /// Check if the member has not started leaving.
    pub fn is_active(&self) -> bool {
        self.exit_height.is_none()
    }
}
