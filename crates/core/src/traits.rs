//! Core traits for contracts and the host that drives them.

use crate::{CallContext, SlashVerdict, TokenLedger};
use bundlr_types::Address;

/// Services the host runtime offers a contract during one transition.
///
/// Calls through the host are synchronous nested calls: they complete (or
/// fail) before the calling transition continues, and a failure makes the
/// whole transition fail.
pub trait Host {
    /// The token ledger used for stake custody.
    fn ledger(&mut self) -> &mut dyn TokenLedger;

    /// Read the slashing verdicts published by another contract.
    ///
    /// Returns `None` if `source` is not a contract the host knows.
    fn verdicts(&self, source: &Address) -> Option<Vec<SlashVerdict>>;
}

/// A contract evaluated from an ordered transaction log.
///
/// # Guarantees
///
/// - **Synchronous**: `apply` never blocks or awaits
/// - **Deterministic**: same state, context and action give the same result
/// - **Atomic**: a rejected action leaves the state untouched
///
/// # Example
///
/// ```ignore
/// match pool.apply(&ctx, &mut host, Action::Join) {
///     Ok(_) => {}
///     Err(e) => println!("rejected: {e}"),
/// }
/// let bundlers = pool.query(&Query::Bundlers);
/// ```
pub trait Contract {
    /// Mutating calls.
    type Action;

    /// Read-only calls.
    type Query;

    /// Values returned by actions and queries.
    type Response;

    /// Why an action was rejected.
    type Error: std::error::Error;

    /// Apply one transaction.
    ///
    /// Returns the optional result value of the action.
    fn apply(
        &mut self,
        ctx: &CallContext,
        host: &mut dyn Host,
        action: Self::Action,
    ) -> Result<Option<Self::Response>, Self::Error>;

    /// Evaluate a pure projection over the current state.
    fn query(&self, query: &Self::Query) -> Self::Response;
}
