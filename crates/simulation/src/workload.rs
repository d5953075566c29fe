//! Randomized call generator for exercising the contracts under churn.

use crate::call::{Call, TokenAction, Transaction};
use crate::genesis::Deployments;
use bundlr_types::{Address, Amount, EvidenceId, Url};
use bundlr_validators::{Evidence, Vote};
use rand::seq::SliceRandom;
use tracing::warn;

/// Shape of the generated workload.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Accounts that act as bundlers, validators and voters.
    pub accounts: Vec<Address>,

    /// Bundler pool owner; the only caller that issues `syncSlash`.
    pub owner: Address,

    /// Allowance granted to a contract on each approve call.
    pub approval: Amount,

    /// Stake offered when joining the validator committee.
    pub validator_stake: Amount,

    /// Fraction of calls (0.0 to 1.0) that touch slashing rather than membership.
    pub slash_ratio: f64,

    /// Calls per batch.
    pub batch_size: usize,
}

impl WorkloadConfig {
    pub fn new(accounts: Vec<Address>, owner: Address) -> Self {
        Self {
            accounts,
            owner,
            approval: Amount(1_000),
            validator_stake: Amount(10),
            slash_ratio: 0.2,
            batch_size: 10,
        }
    }

    pub fn with_approval(mut self, approval: Amount) -> Self {
        self.approval = approval;
        self
    }

    pub fn with_validator_stake(mut self, stake: Amount) -> Self {
        self.validator_stake = stake;
        self
    }

    /// Clamped into `[0.0, 1.0]`; a non-finite ratio disables slashing traffic.
    pub fn with_slash_ratio(mut self, ratio: f64) -> Self {
        self.slash_ratio = probability(ratio);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

fn probability(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Generates joins, exits, epoch updates and slashing traffic.
///
/// Nothing here checks preconditions: plenty of generated calls are meant to
/// be rejected, which exercises the rollback paths as much as the happy ones.
pub struct MembershipWorkload {
    config: WorkloadConfig,
    deployments: Deployments,
    /// Evidence ids proposed so far, candidates for votes.
    proposed: Vec<EvidenceId>,
    next_evidence: u64,
}

impl MembershipWorkload {
    pub fn new(config: WorkloadConfig, deployments: Deployments) -> Self {
        Self {
            config: WorkloadConfig {
                slash_ratio: probability(config.slash_ratio),
                ..config
            },
            deployments,
            proposed: Vec::new(),
            next_evidence: 0,
        }
    }

    /// Generate a batch of transactions.
    pub fn generate_batch(&mut self, rng: &mut impl rand::Rng) -> Vec<Transaction> {
        let mut transactions = Vec::with_capacity(self.config.batch_size);
        for _ in 0..self.config.batch_size {
            if let Some(tx) = self.generate_one(rng) {
                transactions.push(tx);
            }
        }
        transactions
    }

    /// Generate a single transaction, or `None` if there are no accounts.
    pub fn generate_one(&mut self, rng: &mut impl rand::Rng) -> Option<Transaction> {
        let caller = self.config.accounts.choose(rng)?.clone();
        if rng.gen_bool(self.config.slash_ratio) {
            Some(self.slashing_call(caller, rng))
        } else {
            let call = self.membership_call(&caller, rng)?;
            Some(Transaction::new(caller, call))
        }
    }

    fn membership_call(&self, caller: &Address, rng: &mut impl rand::Rng) -> Option<Call> {
        use bundlr_bundlers::Action as Bundlers;
        use bundlr_validators::Action as Validators;

        let call = match rng.gen_range(0..9) {
            0 => Call::Token(TokenAction::Approve {
                spender: self.deployments.bundlers.clone(),
                amount: self.config.approval,
            }),
            1 => Call::Token(TokenAction::Approve {
                spender: self.deployments.validators.clone(),
                amount: self.config.approval,
            }),
            2 => Call::Bundlers(Bundlers::Join),
            3 => Call::Bundlers(Bundlers::Leave),
            4 => Call::Bundlers(Bundlers::Withdraw),
            5 => {
                let url = match Url::parse(&format!("https://{caller}.bundlr.test")) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!(caller = %caller, error = %e, "Cannot build validator url");
                        return None;
                    }
                };
                Call::Validators(Validators::Join {
                    stake: self.config.validator_stake,
                    url,
                })
            }
            6 => Call::Validators(Validators::Leave),
            7 => Call::Validators(Validators::Withdraw),
            _ => Call::Validators(Validators::UpdateEpoch),
        };
        Some(call)
    }

    fn slashing_call(&mut self, caller: Address, rng: &mut impl rand::Rng) -> Transaction {
        use bundlr_validators::Action as Validators;

        if !self.proposed.is_empty() && rng.gen_bool(0.6) {
            let id = self.proposed[rng.gen_range(0..self.proposed.len())].clone();
            let vote = if rng.gen_bool(0.5) {
                Vote::For
            } else {
                Vote::Against
            };
            return Transaction::new(caller, Call::Validators(Validators::VoteSlash { id, vote }));
        }

        if rng.gen_bool(0.2) {
            return Transaction::new(
                self.config.owner.clone(),
                Call::Bundlers(bundlr_bundlers::Action::SyncSlash),
            );
        }

        let n = self.next_evidence;
        self.next_evidence += 1;
        let id = EvidenceId::from(format!("ev-{n}").as_str());
        let accused = self
            .config
            .accounts
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| caller.clone());
        let evidence = Evidence {
            id: id.clone(),
            size: rng.gen_range(1..1_000_000),
            fee: rng.gen_range(1..10_000u32).to_string(),
            currency: "AR".to_string(),
            block: rng.gen_range(1..1_000_000u64).to_string(),
            validator: accused,
            signature: format!("sig-{n}"),
        };
        self.proposed.push(id);
        Transaction::new(caller, Call::Validators(Validators::ProposeSlash { evidence }))
    }
}
