//! Validator committee state and transitions.

use crate::action::{Action, Query, Response};
use crate::config::ValidatorsConfig;
use crate::epoch::{Epoch, EpochConfig};
use crate::error::ValidatorsError;
use crate::evidence::Evidence;
use crate::sampler::sample_committee;
use crate::slashing::{
    resolve_on_expiry, resolve_on_vote, CloseReason, Outcome, SlashProposal, SlashingConfig,
    Tally, Vote, Voting,
};
use crate::validator::ValidatorInfo;
use bundlr_core::{transact, CallContext, Contract, Host, SlashVerdict, TokenLedger, VerdictSource};
use bundlr_membership::{MembershipEngine, MembershipError};
use bundlr_types::{Address, Amount, BlockHeight, EvidenceId, Url};
use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Validator committee contract state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorCommittee {
    bundler: Address,
    bundlers_contract: Address,
    members: MembershipEngine<ValidatorInfo>,

    epoch_config: EpochConfig,
    epoch: Epoch,
    /// Committee drawn at the last epoch change.
    nominated: OrdSet<Address>,

    slashing: SlashingConfig,
    proposals: OrdMap<EvidenceId, SlashProposal>,

    lock_nominated: bool,
}

impl ValidatorCommittee {
    /// Deploy a committee. The genesis epoch is at height zero.
    pub fn new(config: ValidatorsConfig) -> Self {
        Self {
            bundler: config.bundler,
            bundlers_contract: config.bundlers_contract,
            members: MembershipEngine::new(config.pool),
            epoch_config: config.epoch,
            epoch: Epoch::default(),
            nominated: OrdSet::new(),
            slashing: config.slashing,
            proposals: OrdMap::new(),
            lock_nominated: config.lock_nominated,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Projections
    // ═══════════════════════════════════════════════════════════════════════

    pub fn members(&self) -> &MembershipEngine<ValidatorInfo> {
        &self.members
    }

    pub fn epoch(&self) -> &Epoch {
        &self.epoch
    }

    /// Nominated validators that are still Active, sorted.
    pub fn nominated_validators(&self) -> Vec<Address> {
        self.nominated
            .iter()
            .filter(|address| self.members.is_active(address))
            .cloned()
            .collect()
    }

    pub fn proposal(&self, id: &EvidenceId) -> Option<&SlashProposal> {
        self.proposals.get(id)
    }

    pub fn proposals(&self) -> &OrdMap<EvidenceId, SlashProposal> {
        &self.proposals
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Membership
    // ═══════════════════════════════════════════════════════════════════════

    /// Lock `stake` from the caller and register its endpoint.
    pub fn join(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        stake: Amount,
        url: Url,
    ) -> Result<Amount, ValidatorsError> {
        Ok(self
            .members
            .join(ctx, ledger, Some(stake), ValidatorInfo { url })?)
    }

    /// Start the caller's timed exit.
    pub fn leave(&mut self, ctx: &CallContext) -> Result<BlockHeight, ValidatorsError> {
        let caller = &ctx.caller;
        if self.lock_nominated && self.members.is_active(caller) && self.nominated.contains(caller)
        {
            debug!(caller = %caller, "leave rejected: nominated");
            return Err(ValidatorsError::NominatedCannotLeave(caller.clone()));
        }
        Ok(self.members.leave(ctx)?)
    }

    /// Return the caller's stake after the exit delay.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
    ) -> Result<Amount, ValidatorsError> {
        Ok(self.members.withdraw(ctx, ledger)?)
    }

    fn require_active(&self, caller: &Address) -> Result<(), ValidatorsError> {
        if self.members.is_active(caller) {
            Ok(())
        } else {
            debug!(caller = %caller, "rejected: not an active validator");
            Err(MembershipError::NotAMember(caller.clone()).into())
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Committee sampling
    // ═══════════════════════════════════════════════════════════════════════

    /// Close expired proposals, then resample the nominated committee.
    ///
    /// Open to any caller once `epoch_duration` blocks have passed since the
    /// last resample. The seed is the anchor of the current block.
    pub fn update_epoch(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
    ) -> Result<Epoch, ValidatorsError> {
        let next = self.epoch.height + self.epoch_config.duration;
        if ctx.height < next {
            debug!(
                next = next.0,
                height = ctx.height.0,
                "updateEpoch rejected: too soon"
            );
            return Err(ValidatorsError::EpochTooSoon {
                next,
                current: ctx.height,
            });
        }

        transact(self, |committee| {
            let slashed = committee.sweep_expired(ctx.height);
            if !slashed.is_empty() {
                committee.members.forfeit_many(ctx, ledger, &slashed)?;
            }

            let candidates = committee.members.active_addresses();
            let nominated =
                sample_committee(&ctx.anchor, &candidates, committee.epoch_config.max_nominated);
            committee.nominated = nominated.into_iter().collect();
            committee.epoch = committee.epoch.next(ctx.anchor, ctx.height);

            info!(
                seq = committee.epoch.seq,
                height = ctx.height.0,
                active = candidates.len(),
                nominated = committee.nominated.len(),
                "Epoch updated"
            );
            Ok(committee.epoch)
        })
    }

    /// Close every open proposal past its lifetime.
    ///
    /// Returns the accused of proposals that closed as slashed.
    fn sweep_expired(&mut self, height: BlockHeight) -> Vec<Address> {
        let lifetime = self.slashing.proposal_lifetime;
        let expired: Vec<EvidenceId> = self
            .proposals
            .iter()
            .filter(|(_, p)| p.is_open() && p.is_expired(lifetime, height))
            .map(|(id, _)| id.clone())
            .collect();

        let mut slashed = Vec::new();
        for id in expired {
            let Some(mut proposal) = self.proposals.get(&id).cloned() else {
                continue;
            };
            let tally = Tally::count(proposal.votes(), &self.members, self.slashing.weighting);
            let outcome = resolve_on_expiry(&tally, &self.slashing);
            proposal.close(tally, outcome, CloseReason::Expired, height);
            info!(evidence = %id, outcome = ?outcome, "Expired proposal closed");
            if outcome == Outcome::Slashed {
                slashed.push(proposal.accused().clone());
            }
            self.proposals.insert(id, proposal);
        }
        slashed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Slashing governance
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a proposal to slash the identity named in `evidence`.
    pub fn propose_slash(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        evidence: Evidence,
    ) -> Result<SlashProposal, ValidatorsError> {
        let caller = &ctx.caller;
        self.require_active(caller)?;
        evidence.validate()?;

        if self.proposals.contains_key(&evidence.id) {
            debug!(evidence = %evidence.id, "proposeSlash rejected: duplicate");
            return Err(ValidatorsError::DuplicateProposal(evidence.id));
        }

        if let Some(limit) = self.slashing.max_proposals_per_epoch {
            let opened = self
                .proposals
                .values()
                .filter(|p| &p.proposer == caller && p.created_at >= self.epoch.height)
                .count();
            if opened >= limit as usize {
                debug!(proposer = %caller, limit, "proposeSlash rejected: too many proposals");
                return Err(ValidatorsError::TooManyProposals {
                    proposer: caller.clone(),
                    limit,
                });
            }
        }

        let id = evidence.id.clone();
        let mut proposal = SlashProposal::new(evidence, caller.clone(), ctx.height);
        if self.slashing.proposer_votes_for {
            proposal.cast(caller.clone(), Vote::For);
            self.settle(ctx, ledger, &mut proposal)?;
        }
        info!(
            evidence = %id,
            proposer = %caller,
            accused = %proposal.accused(),
            "Slash proposed"
        );
        self.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    /// Record the caller's vote; close the proposal if it reached quorum.
    pub fn vote_slash(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        id: EvidenceId,
        vote: Vote,
    ) -> Result<SlashProposal, ValidatorsError> {
        self.require_active(&ctx.caller)?;

        let Some(proposal) = self.proposals.get(&id) else {
            return Err(ValidatorsError::ProposalNotFound(id));
        };
        if !proposal.is_open() {
            debug!(evidence = %id, voter = %ctx.caller, "voteSlash rejected: closed");
            return Err(ValidatorsError::ProposalClosed(id));
        }
        if proposal.is_expired(self.slashing.proposal_lifetime, ctx.height) {
            debug!(evidence = %id, voter = %ctx.caller, "voteSlash rejected: expired");
            return Err(ValidatorsError::ProposalExpired(id));
        }

        let mut proposal = proposal.clone();
        proposal.cast(ctx.caller.clone(), vote);
        debug!(evidence = %id, voter = %ctx.caller, vote = ?vote, "Vote recorded");

        self.settle(ctx, ledger, &mut proposal)?;
        self.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    /// Close `proposal` if its votes reach quorum, forfeiting on a slash.
    fn settle(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        proposal: &mut SlashProposal,
    ) -> Result<(), ValidatorsError> {
        let tally = Tally::count(proposal.votes(), &self.members, self.slashing.weighting);
        let Some(outcome) = resolve_on_vote(&tally, &self.slashing) else {
            return Ok(());
        };

        proposal.close(tally, outcome, CloseReason::Quorum, ctx.height);
        info!(
            evidence = %proposal.evidence.id,
            outcome = ?outcome,
            for_weight = %tally.for_weight,
            against_weight = %tally.against_weight,
            "Proposal closed"
        );

        let accused = proposal.accused();
        if outcome == Outcome::Slashed && self.members.get(accused).is_some() {
            warn!(accused = %accused, "Slashing validator");
            self.members.forfeit_by_policy(ctx, ledger, accused)?;
        }
        Ok(())
    }

    /// Closed proposals with a slash outcome, by closing height then id.
    pub fn slash_verdicts(&self) -> Vec<SlashVerdict> {
        let mut verdicts: Vec<SlashVerdict> = self
            .proposals
            .iter()
            .filter_map(|(id, proposal)| match &proposal.voting {
                Voting::Closed {
                    outcome: Outcome::Slashed,
                    closed_at,
                    ..
                } => Some(SlashVerdict {
                    evidence_id: id.clone(),
                    accused: proposal.accused().clone(),
                    height: *closed_at,
                }),
                _ => None,
            })
            .collect();
        verdicts.sort_by(|a, b| {
            (a.height, &a.evidence_id).cmp(&(b.height, &b.evidence_id))
        });
        verdicts
    }

    fn dispatch(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        action: Action,
    ) -> Result<Option<Response>, ValidatorsError> {
        let response = match action {
            Action::Join { stake, url } => {
                Response::Stake(self.join(ctx, host.ledger(), stake, url)?)
            }
            Action::Leave => Response::ExitHeight(self.leave(ctx)?),
            Action::Withdraw => Response::Stake(self.withdraw(ctx, host.ledger())?),
            Action::UpdateEpoch => Response::Epoch(self.update_epoch(ctx, host.ledger())?),
            Action::ProposeSlash { evidence } => Response::SlashProposal(Some(
                self.propose_slash(ctx, host.ledger(), evidence)?,
            )),
            Action::VoteSlash { id, vote } => Response::SlashProposal(Some(
                self.vote_slash(ctx, host.ledger(), id, vote)?,
            )),
        };
        Ok(Some(response))
    }
}

impl VerdictSource for ValidatorCommittee {
    fn slash_verdicts(&self) -> Vec<SlashVerdict> {
        ValidatorCommittee::slash_verdicts(self)
    }
}

impl Contract for ValidatorCommittee {
    type Action = Action;
    type Query = Query;
    type Response = Response;
    type Error = ValidatorsError;

    fn apply(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        action: Action,
    ) -> Result<Option<Response>, ValidatorsError> {
        transact(self, |committee| committee.dispatch(ctx, host, action))
    }

    fn query(&self, query: &Query) -> Response {
        let pool = self.members.config();
        match query {
            Query::Validators => Response::Validators(
                self.members
                    .iter()
                    .map(|(address, validator)| (address.clone(), validator.clone()))
                    .collect(),
            ),
            Query::NominatedValidators => {
                Response::NominatedValidators(self.nominated_validators())
            }
            Query::MinimumStake => Response::Stake(pool.stake.amount()),
            Query::Token => Response::Token(pool.token.clone()),
            Query::Epoch => Response::Epoch(self.epoch),
            Query::EpochDuration => Response::Duration(self.epoch_config.duration),
            Query::WithdrawDelay => Response::Duration(pool.withdraw_delay),
            Query::Bundler => Response::Address(self.bundler.clone()),
            Query::BundlersContract => Response::Address(self.bundlers_contract.clone()),
            Query::SlashProposal { id } => {
                Response::SlashProposal(self.proposals.get(id).cloned())
            }
            Query::SlashProposals => Response::SlashProposals(self.proposals.clone()),
            Query::SlashVerdicts => Response::SlashVerdicts(self.slash_verdicts()),
            Query::Forfeited => Response::Forfeited(self.members.forfeited()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::EpochConfig;
    use crate::slashing::{Ratio, VoteWeighting};
    use bundlr_membership::ExitState;
    use bundlr_test_helpers::{addr, anchor, ctx, ctx_with_anchor, funded_ledger, TestHost};
    use bundlr_types::BlockCount;
    use tracing_test::traced_test;

    const COMMITTEE: &str = "validators";

    fn config() -> ValidatorsConfig {
        ValidatorsConfig::new(addr("bundler"), addr("bundlers"), addr("token"), Amount(10))
            .with_epoch(EpochConfig::default().with_duration(BlockCount(5)))
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i:02}")).collect()
    }

    fn url(name: &str) -> Url {
        format!("https://{name}.example.com").parse().unwrap()
    }

    /// Committee with `stakes.len()` joined validators `v00, v01, ...`.
    fn committee_with(config: ValidatorsConfig, stakes: &[u128]) -> (ValidatorCommittee, TestHost) {
        let names = names(stakes.len());
        let holders: Vec<(&str, u128)> = names.iter().map(|n| (n.as_str(), 1_000)).collect();
        let mut ledger = funded_ledger(&holders);
        for name in &names {
            ledger.approve(&addr(name), &addr(COMMITTEE), Amount(1_000));
        }
        let mut host = TestHost::new(ledger);
        let mut committee = ValidatorCommittee::new(config);
        for (name, stake) in names.iter().zip(stakes) {
            committee
                .apply(
                    &ctx(name, COMMITTEE, 1),
                    &mut host,
                    Action::Join {
                        stake: Amount(*stake),
                        url: url(name),
                    },
                )
                .unwrap();
        }
        (committee, host)
    }

    fn evidence(id: &str, accused: &str) -> Evidence {
        Evidence {
            id: EvidenceId::from(id),
            size: 100,
            fee: "100".into(),
            currency: "arweave".into(),
            block: "1900".into(),
            validator: addr(accused),
            signature: "sig".into(),
        }
    }

    fn propose(
        committee: &mut ValidatorCommittee,
        host: &mut TestHost,
        proposer: &str,
        id: &str,
        accused: &str,
        height: u64,
    ) -> Result<Option<Response>, ValidatorsError> {
        committee.apply(
            &ctx(proposer, COMMITTEE, height),
            host,
            Action::ProposeSlash {
                evidence: evidence(id, accused),
            },
        )
    }

    fn vote(
        committee: &mut ValidatorCommittee,
        host: &mut TestHost,
        voter: &str,
        id: &str,
        vote: Vote,
        height: u64,
    ) -> Result<Option<Response>, ValidatorsError> {
        committee.apply(
            &ctx(voter, COMMITTEE, height),
            host,
            Action::VoteSlash {
                id: EvidenceId::from(id),
                vote,
            },
        )
    }

    #[traced_test]
    #[test]
    fn test_join_records_stake_and_url() {
        let (committee, host) = committee_with(config(), &[10, 25]);
        let v01 = committee.members().get(&addr("v01")).unwrap();
        assert_eq!(v01.stake, Amount(25));
        assert_eq!(v01.payload.url, url("v01"));
        assert_eq!(host.balance(COMMITTEE), Amount(35));
    }

    #[traced_test]
    #[test]
    fn test_join_below_minimum_is_rejected() {
        let (mut committee, mut host) = committee_with(config(), &[]);
        let result = committee.apply(
            &ctx("v00", COMMITTEE, 1),
            &mut host,
            Action::Join {
                stake: Amount(9),
                url: url("v00"),
            },
        );
        assert!(matches!(
            result,
            Err(ValidatorsError::Membership(
                MembershipError::StakeBelowMinimum { .. }
            ))
        ));
    }

    #[traced_test]
    #[test]
    fn test_update_epoch_too_soon_changes_nothing() {
        let (mut committee, mut host) = committee_with(config(), &[10; 3]);
        let early = committee.apply(&ctx("anyone", COMMITTEE, 4), &mut host, Action::UpdateEpoch);
        assert_eq!(
            early,
            Err(ValidatorsError::EpochTooSoon {
                next: BlockHeight(5),
                current: BlockHeight(4)
            })
        );

        committee
            .apply(&ctx("anyone", COMMITTEE, 5), &mut host, Action::UpdateEpoch)
            .unwrap();
        let before = committee.clone();
        let again = committee.apply(&ctx("anyone", COMMITTEE, 9), &mut host, Action::UpdateEpoch);
        assert!(matches!(again, Err(ValidatorsError::EpochTooSoon { .. })));
        assert_eq!(committee, before);
        assert_eq!(committee.epoch().seq, 1);
    }

    #[traced_test]
    #[test]
    fn test_small_committee_nominates_everyone() {
        let (mut committee, mut host) = committee_with(config(), &[10; 4]);
        committee
            .apply(&ctx("anyone", COMMITTEE, 5), &mut host, Action::UpdateEpoch)
            .unwrap();
        assert_eq!(committee.nominated_validators().len(), 4);
    }

    #[traced_test]
    #[test]
    fn test_resampling_sixteen_validators() {
        let (mut committee, mut host) = committee_with(config(), &[10; 16]);

        committee
            .apply(
                &ctx_with_anchor("anyone", COMMITTEE, 5, anchor("block-5")),
                &mut host,
                Action::UpdateEpoch,
            )
            .unwrap();
        let first = committee.nominated_validators();
        assert_eq!(committee.epoch().anchor, anchor("block-5"));

        committee
            .apply(
                &ctx_with_anchor("anyone", COMMITTEE, 11, anchor("block-11")),
                &mut host,
                Action::UpdateEpoch,
            )
            .unwrap();
        let second = committee.nominated_validators();

        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert!(first
            .iter()
            .chain(&second)
            .all(|a| committee.members().is_active(a)));
        assert_eq!(committee.epoch().seq, 2);
        assert_eq!(committee.epoch().height, BlockHeight(11));
    }

    #[traced_test]
    #[test]
    fn test_same_history_same_committee() {
        let run = || {
            let (mut committee, mut host) = committee_with(config(), &[10; 16]);
            committee
                .apply(
                    &ctx_with_anchor("anyone", COMMITTEE, 5, anchor("seed")),
                    &mut host,
                    Action::UpdateEpoch,
                )
                .unwrap();
            committee.nominated_validators()
        };
        assert_eq!(run(), run());
    }

    #[traced_test]
    #[test]
    fn test_propose_preconditions() {
        let (mut committee, mut host) = committee_with(config(), &[10; 3]);

        assert_eq!(
            propose(&mut committee, &mut host, "outsider", "tx1", "v02", 2),
            Err(ValidatorsError::Membership(MembershipError::NotAMember(
                addr("outsider")
            )))
        );

        let mut bad = evidence("tx1", "v02");
        bad.size = 0;
        assert!(matches!(
            committee.apply(
                &ctx("v00", COMMITTEE, 2),
                &mut host,
                Action::ProposeSlash { evidence: bad }
            ),
            Err(ValidatorsError::InvalidEvidence(_))
        ));

        propose(&mut committee, &mut host, "v00", "tx1", "v02", 2).unwrap();
        assert_eq!(
            propose(&mut committee, &mut host, "v01", "tx1", "v02", 3),
            Err(ValidatorsError::DuplicateProposal(EvidenceId::from("tx1")))
        );
        assert!(committee.proposal(&EvidenceId::from("tx1")).unwrap().votes().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_quorum_closes_and_slashes_validator() {
        let (mut committee, mut host) = committee_with(config(), &[10; 4]);
        propose(&mut committee, &mut host, "v00", "tx1", "v03", 2).unwrap();

        vote(&mut committee, &mut host, "v00", "tx1", Vote::For, 2).unwrap();
        vote(&mut committee, &mut host, "v01", "tx1", Vote::For, 3).unwrap();
        // 2 of 4 is not more than half.
        assert!(committee.proposal(&EvidenceId::from("tx1")).unwrap().is_open());

        vote(&mut committee, &mut host, "v02", "tx1", Vote::For, 4).unwrap();
        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.outcome(), Some(Outcome::Slashed));
        assert_eq!(proposal.closed_at(), Some(BlockHeight(4)));
        assert_eq!(proposal.votes().len(), 3);

        assert_eq!(committee.members().exit_state(&addr("v03")), ExitState::Absent);
        assert_eq!(committee.members().forfeited(), Amount(10));
        assert_eq!(
            committee.slash_verdicts(),
            vec![SlashVerdict {
                evidence_id: EvidenceId::from("tx1"),
                accused: addr("v03"),
                height: BlockHeight(4),
            }]
        );
    }

    #[traced_test]
    #[test]
    fn test_vote_on_closed_proposal_is_rejected() {
        let (mut committee, mut host) = committee_with(config(), &[10; 3]);
        propose(&mut committee, &mut host, "v00", "tx1", "elsewhere", 2).unwrap();
        vote(&mut committee, &mut host, "v00", "tx1", Vote::Against, 2).unwrap();
        vote(&mut committee, &mut host, "v01", "tx1", Vote::Against, 2).unwrap();
        let closed = committee.proposal(&EvidenceId::from("tx1")).unwrap().clone();
        assert_eq!(closed.outcome(), Some(Outcome::NotSlashed));

        assert_eq!(
            vote(&mut committee, &mut host, "v02", "tx1", Vote::For, 3),
            Err(ValidatorsError::ProposalClosed(EvidenceId::from("tx1")))
        );
        assert_eq!(
            committee.proposal(&EvidenceId::from("tx1")),
            Some(&closed)
        );
        assert!(committee.slash_verdicts().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_votes_of_departed_validators_weigh_nothing() {
        let (mut committee, mut host) = committee_with(config(), &[10; 3]);
        propose(&mut committee, &mut host, "v00", "tx1", "elsewhere", 2).unwrap();
        vote(&mut committee, &mut host, "v02", "tx1", Vote::Against, 2).unwrap();
        committee
            .apply(&ctx("v02", COMMITTEE, 3), &mut host, Action::Leave)
            .unwrap();

        // 1 of the 2 remaining Active validators is not a quorum.
        vote(&mut committee, &mut host, "v00", "tx1", Vote::For, 3).unwrap();
        assert!(committee.proposal(&EvidenceId::from("tx1")).unwrap().is_open());

        vote(&mut committee, &mut host, "v01", "tx1", Vote::For, 4).unwrap();
        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.votes().get(&addr("v02")), Some(&Vote::Against));
        match &proposal.voting {
            Voting::Closed { tally, outcome, .. } => {
                assert_eq!(tally.for_weight, Amount(2));
                assert_eq!(tally.against_weight, Amount(0));
                assert_eq!(tally.total_weight, Amount(2));
                assert_eq!(*outcome, Outcome::Slashed);
            }
            other => panic!("expected a closed proposal, got {other:?}"),
        }
    }

    #[traced_test]
    #[test]
    fn test_votes_overwrite_while_open() {
        let (mut committee, mut host) = committee_with(config(), &[10; 5]);
        propose(&mut committee, &mut host, "v00", "tx1", "v04", 2).unwrap();
        vote(&mut committee, &mut host, "v00", "tx1", Vote::For, 2).unwrap();
        vote(&mut committee, &mut host, "v00", "tx1", Vote::Against, 3).unwrap();

        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.votes().len(), 1);
        assert_eq!(proposal.votes().get(&addr("v00")), Some(&Vote::Against));
        assert_eq!(
            vote(&mut committee, &mut host, "ghost", "nope", Vote::For, 3),
            Err(ValidatorsError::Membership(MembershipError::NotAMember(
                addr("ghost")
            )))
        );
        assert_eq!(
            vote(&mut committee, &mut host, "v01", "nope", Vote::For, 3),
            Err(ValidatorsError::ProposalNotFound(EvidenceId::from("nope")))
        );
    }

    #[traced_test]
    #[test]
    fn test_tie_is_not_slashed() {
        let config = config().with_slashing(SlashingConfig::default().with_quorum(Ratio::new(3, 4)));
        let (mut committee, mut host) = committee_with(config, &[10; 4]);
        propose(&mut committee, &mut host, "v00", "tx1", "v03", 2).unwrap();
        for (voter, v) in [
            ("v00", Vote::For),
            ("v01", Vote::For),
            ("v02", Vote::Against),
            ("v03", Vote::Against),
        ] {
            vote(&mut committee, &mut host, voter, "tx1", v, 3).unwrap();
        }
        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.outcome(), Some(Outcome::NotSlashed));
        assert!(committee.members().is_active(&addr("v03")));
    }

    #[traced_test]
    #[test]
    fn test_stake_weighted_vote() {
        let config =
            config().with_slashing(SlashingConfig::default().with_weighting(VoteWeighting::ByStake));
        let (mut committee, mut host) = committee_with(config, &[10, 10, 10, 70]);
        propose(&mut committee, &mut host, "v03", "tx1", "v00", 2).unwrap();

        vote(&mut committee, &mut host, "v03", "tx1", Vote::For, 2).unwrap();

        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.outcome(), Some(Outcome::Slashed));
        assert!(!committee.members().is_active(&addr("v00")));
    }

    #[traced_test]
    #[test]
    fn test_expired_proposals_are_swept_on_epoch_change() {
        let slashing = SlashingConfig::default()
            .with_quorum(Ratio::new(1, 1))
            .with_proposal_lifetime(BlockCount(2));
        let (mut committee, mut host) = committee_with(config().with_slashing(slashing), &[10; 4]);

        propose(&mut committee, &mut host, "v00", "well-supported", "v03", 2).unwrap();
        propose(&mut committee, &mut host, "v01", "thin", "v02", 2).unwrap();
        for voter in ["v00", "v01", "v02", "v03"] {
            vote(&mut committee, &mut host, voter, "well-supported", Vote::For, 3).unwrap();
        }
        vote(&mut committee, &mut host, "v01", "thin", Vote::For, 3).unwrap();

        assert_eq!(
            vote(&mut committee, &mut host, "v02", "thin", Vote::For, 5),
            Err(ValidatorsError::ProposalExpired(EvidenceId::from("thin")))
        );

        committee
            .apply(&ctx("anyone", COMMITTEE, 5), &mut host, Action::UpdateEpoch)
            .unwrap();

        let supported = committee.proposal(&EvidenceId::from("well-supported")).unwrap();
        assert_eq!(supported.outcome(), Some(Outcome::Slashed));
        assert!(matches!(
            supported.voting,
            Voting::Closed {
                reason: CloseReason::Expired,
                ..
            }
        ));
        let thin = committee.proposal(&EvidenceId::from("thin")).unwrap();
        assert_eq!(thin.outcome(), Some(Outcome::NotSlashed));

        assert!(!committee.members().is_active(&addr("v03")));
        assert!(!committee.nominated_validators().contains(&addr("v03")));
        assert_eq!(committee.nominated_validators().len(), 3);
    }

    #[traced_test]
    #[test]
    fn test_proposals_per_epoch_limit() {
        let config =
            config().with_slashing(SlashingConfig::default().with_max_proposals_per_epoch(1));
        let (mut committee, mut host) = committee_with(config, &[10; 4]);

        propose(&mut committee, &mut host, "v00", "tx1", "x", 2).unwrap();
        assert_eq!(
            propose(&mut committee, &mut host, "v00", "tx2", "x", 3),
            Err(ValidatorsError::TooManyProposals {
                proposer: addr("v00"),
                limit: 1
            })
        );
        propose(&mut committee, &mut host, "v01", "tx2", "x", 3).unwrap();

        committee
            .apply(&ctx("anyone", COMMITTEE, 5), &mut host, Action::UpdateEpoch)
            .unwrap();
        propose(&mut committee, &mut host, "v00", "tx3", "x", 6).unwrap();
    }

    #[traced_test]
    #[test]
    fn test_proposer_vote_counts_when_enabled() {
        let config =
            config().with_slashing(SlashingConfig::default().with_proposer_votes_for(true));
        let (mut committee, mut host) = committee_with(config, &[10; 3]);
        propose(&mut committee, &mut host, "v00", "tx1", "x", 2).unwrap();
        let proposal = committee.proposal(&EvidenceId::from("tx1")).unwrap();
        assert_eq!(proposal.votes().get(&addr("v00")), Some(&Vote::For));
        assert!(proposal.is_open());
    }

    #[traced_test]
    #[test]
    fn test_leave_withdraw_and_nomination_lock() {
        let (mut committee, mut host) =
            committee_with(config().with_lock_nominated(true), &[10; 3]);
        committee
            .apply(&ctx("anyone", COMMITTEE, 5), &mut host, Action::UpdateEpoch)
            .unwrap();

        assert_eq!(
            committee.apply(&ctx("v00", COMMITTEE, 6), &mut host, Action::Leave),
            Err(ValidatorsError::NominatedCannotLeave(addr("v00")))
        );

        let (mut open, mut host) = committee_with(config(), &[10; 3]);
        let exit = open
            .apply(&ctx("v00", COMMITTEE, 6), &mut host, Action::Leave)
            .unwrap();
        assert_eq!(exit, Some(Response::ExitHeight(BlockHeight(16))));
        open.apply(&ctx("v00", COMMITTEE, 16), &mut host, Action::Withdraw)
            .unwrap();
        assert_eq!(host.balance("v00"), Amount(1_000));
    }

    #[test]
    fn test_queries() {
        let (committee, _) = committee_with(config(), &[10, 20]);
        assert_eq!(committee.query(&Query::MinimumStake), Response::Stake(Amount(10)));
        assert_eq!(
            committee.query(&Query::BundlersContract),
            Response::Address(addr("bundlers"))
        );
        assert_eq!(
            committee.query(&Query::EpochDuration),
            Response::Duration(BlockCount(5))
        );
        let Response::Validators(validators) = committee.query(&Query::Validators) else {
            panic!("expected validators");
        };
        assert_eq!(validators.len(), 2);
        assert_eq!(
            committee.query(&Query::SlashProposal {
                id: EvidenceId::from("missing")
            }),
            Response::SlashProposal(None)
        );
    }

    #[test]
    fn test_action_json() {
        let action: Action = serde_json::from_str(
            r#"{"function":"voteSlash","id":"tx1","vote":"for"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::VoteSlash {
                id: EvidenceId::from("tx1"),
                vote: Vote::For
            }
        );
        let join: Action = serde_json::from_str(
            r#"{"function":"join","stake":"10","url":"https://v.example.com"}"#,
        )
        .unwrap();
        assert!(matches!(join, Action::Join { .. }));
    }
}
