//! Slash proposals, votes and their resolution.

use crate::evidence::Evidence;
use bundlr_membership::MembershipEngine;
use bundlr_types::{Address, Amount, BlockCount, BlockHeight};
use im::OrdMap;
use serde::{Deserialize, Serialize};

/// A validator's position on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Vote {
    For,
    Against,
}

/// How a closed proposal was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// The accused is slashed.
    Slashed,
    /// The proposal is rejected; nothing happens to the accused.
    NotSlashed,
}

/// Why a proposal closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    /// Participation crossed the quorum on a vote.
    Quorum,
    /// The proposal outlived its lifetime and was swept at an epoch change.
    Expired,
}

/// How much a vote counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteWeighting {
    /// One Active validator, one vote.
    #[default]
    PerValidator,
    /// Votes weigh the voter's custodied stake.
    ByStake,
}

/// A fraction `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    /// More than half.
    pub const HALF: Ratio = Ratio::new(1, 2);

    /// More than three quarters.
    pub const THREE_QUARTERS: Ratio = Ratio::new(3, 4);

    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// A usable threshold: a non-zero denominator and at most one.
    pub fn is_valid(&self) -> bool {
        self.denominator != 0 && self.numerator <= self.denominator
    }

    /// Check if `part / total` is strictly greater than this ratio.
    pub fn is_exceeded_by(&self, part: Amount, total: Amount) -> bool {
        let lhs = part.get().saturating_mul(self.denominator as u128);
        let rhs = total.get().saturating_mul(self.numerator as u128);
        lhs > rhs
    }
}

/// Parameters of the slashing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlashingConfig {
    /// Share of the Active weight that must have voted to close a proposal.
    pub quorum: Ratio,

    /// Outcome when For and Against weigh the same.
    pub tie: Outcome,

    pub weighting: VoteWeighting,

    /// Blocks a proposal stays open. `None` keeps it open until quorum.
    pub proposal_lifetime: Option<BlockCount>,

    /// Participation an expired proposal needs for its majority to count.
    pub expiry_participation: Ratio,

    /// Proposals one validator may open per epoch. `None` is unlimited.
    pub max_proposals_per_epoch: Option<u32>,

    /// Record the proposer's own vote as For when it proposes.
    pub proposer_votes_for: bool,
}

impl Default for SlashingConfig {
    fn default() -> Self {
        Self {
            quorum: Ratio::HALF,
            tie: Outcome::NotSlashed,
            weighting: VoteWeighting::PerValidator,
            proposal_lifetime: None,
            expiry_participation: Ratio::THREE_QUARTERS,
            max_proposals_per_epoch: None,
            proposer_votes_for: false,
        }
    }
}

impl SlashingConfig {
    pub fn with_quorum(mut self, quorum: Ratio) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_tie(mut self, tie: Outcome) -> Self {
        self.tie = tie;
        self
    }

    pub fn with_weighting(mut self, weighting: VoteWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_proposal_lifetime(mut self, lifetime: BlockCount) -> Self {
        self.proposal_lifetime = Some(lifetime);
        self
    }

    pub fn with_max_proposals_per_epoch(mut self, max: u32) -> Self {
        self.max_proposals_per_epoch = Some(max);
        self
    }

    pub fn with_proposer_votes_for(mut self, enabled: bool) -> Self {
        self.proposer_votes_for = enabled;
        self
    }
}

/// Weighted vote count over the current Active set.
///
/// Votes of addresses that are no longer Active weigh nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub for_weight: Amount,
    pub against_weight: Amount,
    /// Weight of the whole Active set.
    pub total_weight: Amount,
}

impl Tally {
    /// Count `votes` against the Active members of `validators`.
    pub fn count<P: Clone>(
        votes: &OrdMap<Address, Vote>,
        validators: &MembershipEngine<P>,
        weighting: VoteWeighting,
    ) -> Self {
        let weight_of = |address: &Address| -> Amount {
            match validators.get(address) {
                Some(member) if member.is_active() => match weighting {
                    VoteWeighting::PerValidator => Amount(1),
                    VoteWeighting::ByStake => member.stake,
                },
                _ => Amount::ZERO,
            }
        };

        let mut tally = Tally {
            total_weight: match weighting {
                VoteWeighting::PerValidator => Amount(validators.active_count() as u128),
                VoteWeighting::ByStake => validators.active_stake(),
            },
            ..Default::default()
        };
        for (voter, vote) in votes {
            let weight = weight_of(voter);
            match vote {
                Vote::For => tally.for_weight = tally.for_weight.saturating_add(weight),
                Vote::Against => tally.against_weight = tally.against_weight.saturating_add(weight),
            }
        }
        tally
    }

    /// Weight that has voted.
    pub fn participation(&self) -> Amount {
        self.for_weight.saturating_add(self.against_weight)
    }

    /// Strict majority of cast weight, `tie` when even.
    pub fn majority(&self, tie: Outcome) -> Outcome {
        use std::cmp::Ordering;
        match self.for_weight.cmp(&self.against_weight) {
            Ordering::Greater => Outcome::Slashed,
            Ordering::Less => Outcome::NotSlashed,
            Ordering::Equal => tie,
        }
    }
}

/// Voting status of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Voting {
    /// Accepting votes; one per address, later votes overwrite.
    Open { votes: OrdMap<Address, Vote> },
    /// Final. The votes are frozen as they were at closure.
    #[serde(rename_all = "camelCase")]
    Closed {
        votes: OrdMap<Address, Vote>,
        tally: Tally,
        outcome: Outcome,
        reason: CloseReason,
        closed_at: BlockHeight,
    },
}

/// A proposal to slash the identity named in its evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashProposal {
    pub evidence: Evidence,
    pub proposer: Address,
    pub created_at: BlockHeight,
    pub voting: Voting,
}

impl SlashProposal {
    /// Fresh open proposal with no votes.
    pub fn new(evidence: Evidence, proposer: Address, created_at: BlockHeight) -> Self {
        Self {
            evidence,
            proposer,
            created_at,
            voting: Voting::Open {
                votes: OrdMap::new(),
            },
        }
    }

    /// Identity the evidence accuses.
    pub fn accused(&self) -> &Address {
        &self.evidence.validator
    }

    pub fn is_open(&self) -> bool {
        matches!(self.voting, Voting::Open { .. })
    }

    /// Votes cast so far (frozen once closed).
    pub fn votes(&self) -> &OrdMap<Address, Vote> {
        match &self.voting {
            Voting::Open { votes } | Voting::Closed { votes, .. } => votes,
        }
    }

    /// Outcome, once closed.
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.voting {
            Voting::Open { .. } => None,
            Voting::Closed { outcome, .. } => Some(*outcome),
        }
    }

    /// Height of closure, once closed.
    pub fn closed_at(&self) -> Option<BlockHeight> {
        match &self.voting {
            Voting::Open { .. } => None,
            Voting::Closed { closed_at, .. } => Some(*closed_at),
        }
    }

    /// Check if the proposal is past its lifetime at `height`.
    pub fn is_expired(&self, lifetime: Option<BlockCount>, height: BlockHeight) -> bool {
        lifetime.is_some_and(|lifetime| height > self.created_at + lifetime)
    }

    /// Record or overwrite `voter`'s vote. No-op once closed.
    pub(crate) fn cast(&mut self, voter: Address, vote: Vote) {
        if let Voting::Open { votes } = &mut self.voting {
            votes.insert(voter, vote);
        }
    }

    /// Freeze the votes with the given resolution.
    pub(crate) fn close(
        &mut self,
        tally: Tally,
        outcome: Outcome,
        reason: CloseReason,
        height: BlockHeight,
    ) {
        let votes = self.votes().clone();
        self.voting = Voting::Closed {
            votes,
            tally,
            outcome,
            reason,
            closed_at: height,
        };
    }
}

/// Resolution of an open proposal after a vote, if quorum was reached.
pub(crate) fn resolve_on_vote(tally: &Tally, config: &SlashingConfig) -> Option<Outcome> {
    config
        .quorum
        .is_exceeded_by(tally.participation(), tally.total_weight)
        .then(|| tally.majority(config.tie))
}

/// Resolution of a proposal swept after its lifetime.
///
/// Slashes only on a strict For majority with participation above the expiry
/// threshold. Ties fail regardless of the configured tie outcome.
pub(crate) fn resolve_on_expiry(tally: &Tally, config: &SlashingConfig) -> Outcome {
    let participated = config
        .expiry_participation
        .is_exceeded_by(tally.participation(), tally.total_weight);
    if participated && tally.for_weight > tally.against_weight {
        Outcome::Slashed
    } else {
        Outcome::NotSlashed
    }
}
