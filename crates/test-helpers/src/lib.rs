//! Test fixtures shared by the contract crates.
//!
//! Nothing in here is used outside `#[cfg(test)]` code and integration tests.

use std::collections::BTreeMap;

use bundlr_core::{CallContext, Host, MemoryLedger, SlashVerdict, TokenLedger};
use bundlr_types::{Address, Amount, BlockHeight, Hash};

/// Ticker used by every fixture ledger.
pub const TEST_TICKER: &str = "BND";

/// Parse a fixture address.
///
/// # Panics
///
/// Panics if `name` is not a valid address (empty or whitespace).
pub fn addr(name: &str) -> Address {
    name.parse()
        .unwrap_or_else(|e| panic!("invalid fixture address {name:?}: {e}"))
}

/// Call context for `caller` invoking `contract` at `height`, zero anchor.
pub fn ctx(caller: &str, contract: &str, height: u64) -> CallContext {
    ctx_with_anchor(caller, contract, height, Hash::ZERO)
}

/// Call context with an explicit anchor.
pub fn ctx_with_anchor(caller: &str, contract: &str, height: u64, anchor: Hash) -> CallContext {
    CallContext::new(addr(caller), addr(contract), BlockHeight(height), anchor)
}

/// Anchor derived from a label, so tests can vary the sampling seed.
pub fn anchor(label: &str) -> Hash {
    Hash::from_bytes(label.as_bytes())
}

/// Ledger holding the given balances.
pub fn funded_ledger(holders: &[(&str, u128)]) -> MemoryLedger {
    MemoryLedger::with_balances(
        TEST_TICKER,
        holders
            .iter()
            .map(|(name, amount)| (addr(name), Amount(*amount))),
    )
}

/// A [`Host`] backed by a [`MemoryLedger`] and a fixed verdict table.
#[derive(Debug, Clone, Default)]
pub struct TestHost {
    /// Token ledger.
    pub ledger: MemoryLedger,
    /// Verdicts per publishing contract.
    pub verdicts: BTreeMap<Address, Vec<SlashVerdict>>,
}

impl TestHost {
    /// Host over the given ledger, no verdict sources.
    pub fn new(ledger: MemoryLedger) -> Self {
        Self {
            ledger,
            verdicts: BTreeMap::new(),
        }
    }

    /// Register `source` as a contract publishing `verdicts`.
    pub fn with_verdicts(mut self, source: &str, verdicts: Vec<SlashVerdict>) -> Self {
        self.verdicts.insert(addr(source), verdicts);
        self
    }

    /// Balance of a named holder.
    pub fn balance(&self, name: &str) -> Amount {
        self.ledger.balance_of(&addr(name))
    }
}

impl Host for TestHost {
    fn ledger(&mut self) -> &mut dyn TokenLedger {
        &mut self.ledger
    }

    fn verdicts(&self, source: &Address) -> Option<Vec<SlashVerdict>> {
        self.verdicts.get(source).cloned()
    }
}
