//! Validator committee errors.

use crate::evidence::EvidenceError;
use bundlr_core::LedgerError;
use bundlr_membership::MembershipError;
use bundlr_types::{Address, BlockHeight, EvidenceId};
use thiserror::Error;

/// Why a validator committee action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorsError {
    /// Rejected membership transition, or a non-validator caller.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// `updateEpoch` before the epoch duration elapsed.
    #[error("Next epoch starts at {next}, current height is {current}")]
    EpochTooSoon {
        /// First height at which `updateEpoch` succeeds.
        next: BlockHeight,
        current: BlockHeight,
    },

    /// A proposal for this evidence exists (open or closed).
    #[error("Evidence {0} was already proposed")]
    DuplicateProposal(EvidenceId),

    #[error("No proposal for evidence {0}")]
    ProposalNotFound(EvidenceId),

    /// Voting on the proposal has concluded.
    #[error("Proposal {0} is closed")]
    ProposalClosed(EvidenceId),

    /// Voting on the proposal ran out of time.
    #[error("Proposal {0} has expired")]
    ProposalExpired(EvidenceId),

    /// Proposer already used its per-epoch allowance.
    #[error("{proposer} already opened {limit} proposals this epoch")]
    TooManyProposals { proposer: Address, limit: u32 },

    #[error("Invalid evidence: {0}")]
    InvalidEvidence(#[from] EvidenceError),

    /// Nominated validators must serve out the epoch.
    #[error("{0} is nominated and cannot leave this epoch")]
    NominatedCannotLeave(Address),
}

impl From<LedgerError> for ValidatorsError {
    fn from(err: LedgerError) -> Self {
        ValidatorsError::Membership(MembershipError::Ledger(err))
    }
}
