//! The membership state machine.

use crate::config::{ForfeitDestination, PoolConfig, StakeRequirement};
use crate::error::MembershipError;
use crate::member::{ExitState, Member};
use bundlr_core::{transact, CallContext, TokenLedger};
use bundlr_types::{Address, Amount, BlockHeight};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of forfeiting stake from one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forfeiture {
    /// Member that lost stake.
    pub address: Address,
    /// Amount taken.
    pub amount: Amount,
    /// Stake left after the forfeit.
    pub remaining: Amount,
    /// Whether the record was cleared (stake reached zero).
    pub removed: bool,
}

/// Stake-gated membership pool.
///
/// Holds one record per present member, keyed by address. Absent addresses
/// have no record. Every transition either succeeds in full or returns an
/// error and leaves both the pool and the ledger untouched.
///
/// Ledger calls are always the last fallible step of a transition, so an
/// error from the ledger never leaves a half-written record behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipEngine<P: Clone> {
    config: PoolConfig,
    members: OrdMap<Address, Member<P>>,
    /// Total stake taken by forfeits over the pool's lifetime.
    forfeited: Amount,
}

impl<P: Clone> MembershipEngine<P> {
    /// Create an empty pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            members: OrdMap::new(),
            forfeited: Amount::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Projections
    // ═══════════════════════════════════════════════════════════════════════

    /// Pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Record of a present member.
    pub fn get(&self, address: &Address) -> Option<&Member<P>> {
        self.members.get(address)
    }

    /// Lifecycle state of any address.
    pub fn exit_state(&self, address: &Address) -> ExitState {
        self.members
            .get(address)
            .map(Member::exit_state)
            .unwrap_or(ExitState::Absent)
    }

    /// Check if `address` is an Active member.
    pub fn is_active(&self, address: &Address) -> bool {
        self.members.get(address).is_some_and(Member::is_active)
    }

    /// All present members in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Member<P>)> {
        self.members.iter()
    }

    /// Addresses of Active members, sorted.
    pub fn active_addresses(&self) -> Vec<Address> {
        self.members
            .iter()
            .filter(|(_, member)| member.is_active())
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Number of Active members.
    pub fn active_count(&self) -> usize {
        self.members.values().filter(|m| m.is_active()).count()
    }

    /// Sum of the stake held for Active members.
    pub fn active_stake(&self) -> Amount {
        self.members
            .values()
            .filter(|m| m.is_active())
            .map(|m| m.stake)
            .sum()
    }

    /// Stake custodied for `address`, zero if Absent.
    pub fn stake_of(&self, address: &Address) -> Amount {
        self.members
            .get(address)
            .map(|m| m.stake)
            .unwrap_or(Amount::ZERO)
    }

    /// Total stake taken by forfeits.
    pub fn forfeited(&self) -> Amount {
        self.forfeited
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transitions
    // ═══════════════════════════════════════════════════════════════════════

    /// Lock stake from the caller and make it an Active member.
    ///
    /// For a flat pool `offered` is ignored. For a minimum-stake pool the
    /// caller locks `offered`, or the minimum when nothing is offered.
    ///
    /// The stake is pulled with `transferFrom(caller -> contract)`, so the
    /// caller must have approved the contract for at least the stake.
    ///
    /// Returns the stake that was locked.
    pub fn join(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        offered: Option<Amount>,
        payload: P,
    ) -> Result<Amount, MembershipError> {
        let caller = &ctx.caller;
        if self.members.contains_key(caller) {
            debug!(caller = %caller, "join rejected: already a member");
            return Err(MembershipError::AlreadyMember(caller.clone()));
        }

        let stake = match self.config.stake {
            StakeRequirement::Flat(amount) => amount,
            StakeRequirement::Minimum(minimum) => {
                let offered = offered.unwrap_or(minimum);
                if offered < minimum {
                    debug!(caller = %caller, offered = %offered, minimum = %minimum, "join rejected: stake below minimum");
                    return Err(MembershipError::StakeBelowMinimum { offered, minimum });
                }
                offered
            }
        };

        if !stake.is_zero() {
            ledger
                .transfer_from(&ctx.contract, caller, &ctx.contract, stake)
                .map_err(|source| {
                    debug!(caller = %caller, stake = %stake, error = %source, "join rejected: stake pull failed");
                    MembershipError::InsufficientStake {
                        address: caller.clone(),
                        stake,
                        source,
                    }
                })?;
        }

        self.members.insert(
            caller.clone(),
            Member {
                stake,
                exit_height: None,
                joined_at: ctx.height,
                payload,
            },
        );

        info!(
            member = %caller,
            stake = %stake,
            height = ctx.height.0,
            "Member joined"
        );
        Ok(stake)
    }

    /// Start leaving: Active becomes PendingExit(now + withdraw delay).
    ///
    /// No tokens move. Returns the exit height.
    pub fn leave(&mut self, ctx: &CallContext) -> Result<BlockHeight, MembershipError> {
        let caller = &ctx.caller;
        let member = match self.members.get(caller) {
            Some(member) if member.is_active() => member,
            _ => {
                debug!(caller = %caller, "leave rejected: not an active member");
                return Err(MembershipError::NotAMember(caller.clone()));
            }
        };

        let exit_height = ctx.height + self.config.withdraw_delay;
        let mut member = member.clone();
        member.exit_height = Some(exit_height);
        self.members.insert(caller.clone(), member);

        info!(
            member = %caller,
            exit_height = exit_height.0,
            "Member leaving"
        );
        Ok(exit_height)
    }

    /// Return the caller's stake and clear its record.
    ///
    /// Only allowed from PendingExit(h) once the current height is at least h.
    /// Returns the stake that was paid out.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
    ) -> Result<Amount, MembershipError> {
        let caller = &ctx.caller;
        let Some(member) = self.members.get(caller) else {
            debug!(caller = %caller, "withdraw rejected: absent");
            return Err(MembershipError::NotPendingExit(caller.clone()));
        };
        let Some(exit_height) = member.exit_height else {
            debug!(caller = %caller, "withdraw rejected: still active");
            return Err(MembershipError::NotPendingExit(caller.clone()));
        };
        if ctx.height < exit_height {
            debug!(
                caller = %caller,
                exit_height = exit_height.0,
                height = ctx.height.0,
                "withdraw rejected: delay not elapsed"
            );
            return Err(MembershipError::ExitDelayNotElapsed {
                address: caller.clone(),
                exit_height,
                current: ctx.height,
            });
        }

        let stake = member.stake;
        if !stake.is_zero() {
            ledger.transfer(&ctx.contract, caller, stake)?;
        }
        self.members.remove(caller);

        info!(member = %caller, stake = %stake, "Member withdrew");
        Ok(stake)
    }

    /// Take up to `amount` of a member's stake, Active or PendingExit.
    ///
    /// The exit state is untouched; a record whose stake reaches zero is
    /// cleared. The forfeited tokens go to the configured destination.
    ///
    /// Not an externally callable action: only slashing reaches this.
    pub fn forfeit(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        address: &Address,
        amount: Amount,
    ) -> Result<Forfeiture, MembershipError> {
        transact(self, |pool| {
            let forfeiture = pool.reduce_stake(address, amount)?;
            pool.dispose(ctx, ledger, forfeiture.amount)?;
            Ok(forfeiture)
        })
    }

    /// Forfeit from `address` the share the pool's policy dictates.
    pub fn forfeit_by_policy(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        address: &Address,
    ) -> Result<Forfeiture, MembershipError> {
        let amount = self.config.forfeit.amount_for(self.stake_of(address));
        self.forfeit(ctx, ledger, address, amount)
    }

    /// Forfeit by policy from every present member in `addresses`.
    ///
    /// Absent addresses are skipped. The forfeited total moves with a single
    /// ledger call, so either every member is slashed or none is.
    pub fn forfeit_many<'a>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        addresses: impl IntoIterator<Item = &'a Address>,
    ) -> Result<Vec<Forfeiture>, MembershipError> {
        transact(self, |pool| {
            let mut forfeitures = Vec::new();
            for address in addresses {
                if !pool.members.contains_key(address) {
                    continue;
                }
                let amount = pool.config.forfeit.amount_for(pool.stake_of(address));
                forfeitures.push(pool.reduce_stake(address, amount)?);
            }
            let total: Amount = forfeitures.iter().map(|f| f.amount).sum();
            pool.dispose(ctx, ledger, total)?;
            Ok(forfeitures)
        })
    }

    fn reduce_stake(
        &mut self,
        address: &Address,
        amount: Amount,
    ) -> Result<Forfeiture, MembershipError> {
        let Some(member) = self.members.get(address) else {
            return Err(MembershipError::NotAMember(address.clone()));
        };

        let amount = amount.min(member.stake);
        let remaining = member.stake.saturating_sub(amount);
        let removed = remaining.is_zero();
        if removed {
            self.members.remove(address);
        } else {
            let mut member = member.clone();
            member.stake = remaining;
            self.members.insert(address.clone(), member);
        }
        self.forfeited = self.forfeited.saturating_add(amount);

        warn!(
            member = %address,
            amount = %amount,
            remaining = %remaining,
            removed,
            "Stake forfeited"
        );
        Ok(Forfeiture {
            address: address.clone(),
            amount,
            remaining,
            removed,
        })
    }

    /// Move forfeited tokens out of custody per the configured destination.
    fn dispose(
        &self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        amount: Amount,
    ) -> Result<(), MembershipError> {
        if amount.is_zero() {
            return Ok(());
        }
        match &self.config.forfeit_destination {
            ForfeitDestination::Retain => {}
            ForfeitDestination::Burn => ledger.burn(&ctx.contract, amount)?,
            ForfeitDestination::Treasury(treasury) => {
                ledger.transfer(&ctx.contract, treasury, amount)?
            }
        }
        Ok(())
    }
}
