//! Validator committee call surface.

use crate::epoch::Epoch;
use crate::evidence::Evidence;
use crate::slashing::{SlashProposal, Vote};
use crate::validator::Validator;
use bundlr_core::SlashVerdict;
use bundlr_types::{Address, Amount, BlockCount, BlockHeight, EvidenceId, Url};
use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Mutating calls, tagged by `"function"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum Action {
    /// Lock `stake` (at least the minimum) and register `url`.
    Join { stake: Amount, url: Url },
    Leave,
    Withdraw,
    /// Resample the nominated committee. Open to anyone.
    UpdateEpoch,
    ProposeSlash { evidence: Evidence },
    VoteSlash { id: EvidenceId, vote: Vote },
}

/// Read-only projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum Query {
    Validators,
    NominatedValidators,
    MinimumStake,
    Token,
    Epoch,
    EpochDuration,
    WithdrawDelay,
    Bundler,
    BundlersContract,
    SlashProposal { id: EvidenceId },
    SlashProposals,
    SlashVerdicts,
    Forfeited,
}

/// Values returned by actions and queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum Response {
    Validators(OrdMap<Address, Validator>),
    NominatedValidators(Vec<Address>),
    Stake(Amount),
    Token(Address),
    Epoch(Epoch),
    Duration(BlockCount),
    Address(Address),
    SlashProposal(Option<SlashProposal>),
    SlashProposals(OrdMap<EvidenceId, SlashProposal>),
    SlashVerdicts(Vec<SlashVerdict>),
    Forfeited(Amount),
    /// Result of `leave`.
    ExitHeight(BlockHeight),
}
