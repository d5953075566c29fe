//! Token ledger interface and an in-memory implementation.

use bundlr_types::{Address, Amount};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors returned by the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transfers, approvals of spend and burns must move a positive amount.
    #[error("Amount must be higher than zero")]
    ZeroAmount,

    /// The debited account does not hold enough tokens.
    #[error("Insufficient balance: {owner} holds {balance}, needs {required}")]
    InsufficientBalance {
        /// Debited account.
        owner: Address,
        /// Its balance.
        balance: Amount,
        /// Amount the call tried to move.
        required: Amount,
    },

    /// The spender was not approved for enough of the owner's tokens.
    #[error("Insufficient allowance: {spender} may spend {allowance} of {owner}, needs {required}")]
    InsufficientAllowance {
        /// Token owner.
        owner: Address,
        /// Principal spending on the owner's behalf.
        spender: Address,
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the call tried to move.
        required: Amount,
    },

    /// A credit would overflow the receiving balance.
    #[error("Balance overflow for {0}")]
    Overflow(Address),
}

/// A fungible-token ledger with allowance-based pulls.
///
/// Every method is atomic: on error, no balance or allowance has changed.
pub trait TokenLedger {
    /// Balance of `owner`.
    fn balance_of(&self, owner: &Address) -> Amount;

    /// How much `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `caller` to `to`.
    fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount)
        -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` on behalf of `caller`.
    ///
    /// Unless `caller == from`, this spends `caller`'s allowance on `from`.
    fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Destroy `amount` of `caller`'s tokens.
    fn burn(&mut self, caller: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// In-memory token ledger.
///
/// Built on persistent maps so the whole ledger can be snapshotted per block
/// for free.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLedger {
    ticker: String,
    total_supply: Amount,
    balances: OrdMap<Address, Amount>,
    /// owner -> spender -> remaining allowance
    allowances: OrdMap<Address, OrdMap<Address, Amount>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Create a ledger with initial balances.
    pub fn with_balances(
        ticker: impl Into<String>,
        balances: impl IntoIterator<Item = (Address, Amount)>,
    ) -> Self {
        let mut ledger = Self::new(ticker);
        for (owner, amount) in balances {
            ledger.mint(&owner, amount);
        }
        ledger
    }

    /// Credit new tokens to `to`. Genesis only; saturates at `u128::MAX`.
    pub fn mint(&mut self, to: &Address, amount: Amount) {
        let balance = self.balance_of(to);
        self.balances.insert(to.clone(), balance.saturating_add(amount));
        self.total_supply = self.total_supply.saturating_add(amount);
    }

    /// Set how much `spender` may move out of `owner`'s balance.
    ///
    /// An amount of zero removes the allowance.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let mut spenders = self.allowances.get(owner).cloned().unwrap_or_default();
        if amount.is_zero() {
            spenders.remove(spender);
        } else {
            spenders.insert(spender.clone(), amount);
        }

        if spenders.is_empty() {
            self.allowances.remove(owner);
        } else {
            self.allowances.insert(owner.clone(), spenders);
        }
    }

    /// Token ticker.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// All non-empty balances.
    pub fn balances(&self) -> &OrdMap<Address, Amount> {
        &self.balances
    }

    fn debit(&mut self, owner: &Address, amount: Amount) -> Result<(), LedgerError> {
        let balance = self.balance_of(owner);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                owner: owner.clone(),
                balance,
                required: amount,
            })?;
        if remaining.is_zero() {
            self.balances.remove(owner);
        } else {
            self.balances.insert(owner.clone(), remaining);
        }
        Ok(())
    }

    fn check_credit(&self, to: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(to.clone()))
    }

    /// Validate then apply a move; nothing is written if validation fails.
    fn move_tokens(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: from.clone(),
                balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        self.check_credit(to, amount)?;

        self.debit(from, amount)?;
        let credited = self.balance_of(to).saturating_add(amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(Amount::ZERO)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.move_tokens(caller, to, amount).inspect_err(|e| {
            debug!(caller = %caller, to = %to, amount = %amount, error = %e, "transfer rejected");
        })
    }

    fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        // The owner moving its own tokens needs no allowance.
        if caller != from {
            let allowance = self.allowance(from, caller);
            if allowance < amount {
                debug!(
                    owner = %from,
                    spender = %caller,
                    allowance = %allowance,
                    required = %amount,
                    "transferFrom rejected: allowance"
                );
                return Err(LedgerError::InsufficientAllowance {
                    owner: from.clone(),
                    spender: caller.clone(),
                    allowance,
                    required: amount,
                });
            }
            self.move_tokens(from, to, amount).inspect_err(|e| {
                debug!(owner = %from, spender = %caller, error = %e, "transferFrom rejected");
            })?;
            self.approve(from, caller, allowance.saturating_sub(amount));
            return Ok(());
        }

        self.move_tokens(from, to, amount)
    }

    fn burn(&mut self, caller: &Address, amount: Amount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        self.debit(caller, amount)?;
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }
}
