//! Bundler pool state and transitions.

use crate::action::{Action, Query, Response};
use crate::admission::AdmissionList;
use crate::config::BundlersConfig;
use crate::error::BundlersError;
use bundlr_core::{transact, CallContext, Contract, Host, TokenLedger};
use bundlr_membership::{Forfeiture, MembershipEngine};
use bundlr_types::{Address, Amount, BlockHeight, EvidenceId};
use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Bundler pool contract state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerPool {
    admission: AdmissionList,
    members: MembershipEngine<()>,
    validators_contract: Option<Address>,
    gate_join: bool,
    /// Verdicts already applied by `syncSlash`.
    synced_verdicts: OrdSet<EvidenceId>,
}

impl BundlerPool {
    /// Deploy a pool.
    pub fn new(config: BundlersConfig) -> Self {
        Self {
            admission: AdmissionList::with_interactors(
                config.owner,
                config.allowed_interactors,
            ),
            members: MembershipEngine::new(config.pool),
            validators_contract: config.validators_contract,
            gate_join: config.gate_join,
            synced_verdicts: OrdSet::new(),
        }
    }

    /// Membership records.
    pub fn members(&self) -> &MembershipEngine<()> {
        &self.members
    }

    /// Admission list.
    pub fn admission(&self) -> &AdmissionList {
        &self.admission
    }

    /// Present bundlers mapped to their exit height (`None` while Active).
    pub fn bundlers(&self) -> OrdMap<Address, Option<BlockHeight>> {
        self.members
            .iter()
            .map(|(address, member)| (address.clone(), member.exit_height))
            .collect()
    }

    /// Evidence ids already applied by `syncSlash`.
    pub fn synced_verdicts(&self) -> &OrdSet<EvidenceId> {
        &self.synced_verdicts
    }

    /// Lock the flat stake from the caller.
    pub fn join(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
    ) -> Result<Amount, BundlersError> {
        if self.gate_join {
            self.admission.authorize(&ctx.caller)?;
        }
        Ok(self.members.join(ctx, ledger, None, ())?)
    }

    /// Start the caller's timed exit.
    pub fn leave(&mut self, ctx: &CallContext) -> Result<BlockHeight, BundlersError> {
        Ok(self.members.leave(ctx)?)
    }

    /// Return the caller's stake after the exit delay.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
    ) -> Result<Amount, BundlersError> {
        Ok(self.members.withdraw(ctx, ledger)?)
    }

    /// Apply verdicts published by the validator committee since the last sync.
    ///
    /// Verdicts naming an address that is not a bundler are marked synced
    /// and otherwise ignored. Returns what was taken from each slashed bundler.
    pub fn sync_slash(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
    ) -> Result<Vec<Forfeiture>, BundlersError> {
        self.admission.authorize(&ctx.caller)?;

        let source = self
            .validators_contract
            .as_ref()
            .ok_or(BundlersError::NoVerdictSource)?;
        let verdicts = host.verdicts(source).ok_or_else(|| {
            debug!(source = %source, "syncSlash rejected: unknown verdict source");
            BundlersError::NoVerdictSource
        })?;

        let mut accused = Vec::new();
        for verdict in verdicts {
            if self.synced_verdicts.contains(&verdict.evidence_id) {
                continue;
            }
            debug!(evidence = %verdict.evidence_id, accused = %verdict.accused, "Applying verdict");
            self.synced_verdicts.insert(verdict.evidence_id);
            accused.push(verdict.accused);
        }

        let forfeitures = self.members.forfeit_many(ctx, host.ledger(), &accused)?;
        info!(
            verdicts = accused.len(),
            slashed = forfeitures.len(),
            "Synced slashing verdicts"
        );
        Ok(forfeitures)
    }

    fn dispatch(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        action: Action,
    ) -> Result<Option<Response>, BundlersError> {
        let response = match action {
            Action::Join => Some(Response::Stake(self.join(ctx, host.ledger())?)),
            Action::Leave => Some(Response::ExitHeight(self.leave(ctx)?)),
            Action::Withdraw => Some(Response::Stake(self.withdraw(ctx, host.ledger())?)),
            Action::AddAllowedInteractor { interactor } => {
                self.admission.add(&ctx.caller, interactor)?;
                None
            }
            Action::RemoveAllowedInteractor { interactor } => {
                self.admission.remove(&ctx.caller, &interactor)?;
                None
            }
            Action::SyncSlash => Some(Response::Slashed(self.sync_slash(ctx, host)?)),
        };
        Ok(response)
    }
}

impl Contract for BundlerPool {
    type Action = Action;
    type Query = Query;
    type Response = Response;
    type Error = BundlersError;

    fn apply(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        action: Action,
    ) -> Result<Option<Response>, BundlersError> {
        transact(self, |pool| pool.dispatch(ctx, host, action))
    }

    fn query(&self, query: &Query) -> Response {
        let config = self.members.config();
        match query {
            Query::Bundlers => Response::Bundlers(self.bundlers()),
            Query::AllowedInteractors => Response::AllowedInteractors(
                self.admission.interactors().iter().cloned().collect(),
            ),
            Query::WithdrawDelay => Response::WithdrawDelay(config.withdraw_delay),
            Query::Stake => Response::Stake(config.stake.amount()),
            Query::Token => Response::Token(config.token.clone()),
            Query::Owner => Response::Owner(self.admission.owner().clone()),
            Query::Forfeited => Response::Forfeited(self.members.forfeited()),
        }
    }
}
