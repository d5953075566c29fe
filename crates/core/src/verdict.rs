//! Slashing outcomes readable across contracts.

use bundlr_types::{Address, BlockHeight, EvidenceId};
use serde::{Deserialize, Serialize};

/// A closed slash proposal whose outcome was "slash".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashVerdict {
    /// Evidence the proposal was keyed by.
    pub evidence_id: EvidenceId,

    /// Address named by the evidence.
    pub accused: Address,

    /// Height at which the proposal closed.
    pub height: BlockHeight,
}

/// Anything that publishes slashing verdicts.
pub trait VerdictSource {
    /// All verdicts so far, in a deterministic order.
    fn slash_verdicts(&self) -> Vec<SlashVerdict>;
}
