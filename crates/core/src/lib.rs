//! Core seams for the bundling network contracts.
//!
//! Contracts in this workspace are deterministic, synchronous transition
//! functions over a materialized state. This crate defines what they see of
//! the outside world:
//!
//! - [`CallContext`]: caller, invoked contract, block height and the
//!   per-block anchor, supplied by the host for every transaction
//! - [`TokenLedger`]: the fungible-token ledger invoked synchronously from
//!   inside a transition (stake pulls, stake returns, forfeitures)
//! - [`VerdictSource`]: read-only view of closed slashing outcomes that one
//!   contract can read from another
//! - [`Contract`] / [`Host`]: the uniform apply/query surface a host runtime
//!   drives
//!
//! [`MemoryLedger`] is an in-memory [`TokenLedger`] with allowance
//! semantics, used by the simulation host and in tests.

mod atomic;
mod context;
mod ledger;
mod traits;
mod verdict;

pub use atomic::transact;
pub use context::CallContext;
pub use ledger::{LedgerError, MemoryLedger, TokenLedger};
pub use traits::{Contract, Host};
pub use verdict::{SlashVerdict, VerdictSource};
