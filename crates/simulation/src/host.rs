//! Host services offered to a contract while it applies a transaction.

use bundlr_core::{Host, MemoryLedger, SlashVerdict, TokenLedger, VerdictSource};
use bundlr_types::Address;

/// Nested-call surface for one transaction: the token ledger plus read-only
/// views of the other contracts' slashing verdicts.
pub struct ChainHost<'a> {
    ledger: &'a mut MemoryLedger,
    sources: Vec<(&'a Address, &'a dyn VerdictSource)>,
}

impl<'a> ChainHost<'a> {
    pub fn new(ledger: &'a mut MemoryLedger) -> Self {
        Self {
            ledger,
            sources: Vec::new(),
        }
    }

    /// Expose the verdicts of the contract deployed at `address`.
    pub fn with_source(mut self, address: &'a Address, source: &'a dyn VerdictSource) -> Self {
        self.sources.push((address, source));
        self
    }
}

impl Host for ChainHost<'_> {
    fn ledger(&mut self) -> &mut dyn TokenLedger {
        &mut *self.ledger
    }

    fn verdicts(&self, source: &Address) -> Option<Vec<SlashVerdict>> {
        self.sources
            .iter()
            .find(|(address, _)| *address == source)
            .map(|(_, contract)| contract.slash_verdicts())
    }
}
