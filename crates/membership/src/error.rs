//! Error types for membership transitions.

use bundlr_core::LedgerError;
use bundlr_types::{Address, Amount, BlockHeight};
use thiserror::Error;

/// Why a membership transition was rejected.
///
/// A rejected transition never changes a record or a balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// `join` by an address that is Active or PendingExit.
    #[error("{0} is already a member")]
    AlreadyMember(Address),

    /// The caller is not an Active member.
    #[error("{0} is not an active member")]
    NotAMember(Address),

    /// `withdraw` by an address that has not called `leave`.
    #[error("{0} is not pending exit")]
    NotPendingExit(Address),

    /// `withdraw` before the exit height.
    #[error("{address} may withdraw at {exit_height}, current height is {current}")]
    ExitDelayNotElapsed {
        /// Leaving member.
        address: Address,
        /// First height at which withdraw succeeds.
        exit_height: BlockHeight,
        /// Height of the rejected call.
        current: BlockHeight,
    },

    /// Offered stake is below the pool's minimum.
    #[error("Stake {offered} is below the minimum of {minimum}")]
    StakeBelowMinimum {
        /// Stake offered by the caller.
        offered: Amount,
        /// Pool minimum.
        minimum: Amount,
    },

    /// Pulling the stake from the caller failed (allowance or balance).
    #[error("Could not lock stake of {stake} from {address}")]
    InsufficientStake {
        /// Joining address.
        address: Address,
        /// Stake the pool tried to pull.
        stake: Amount,
        /// Ledger rejection.
        source: LedgerError,
    },

    /// A nested ledger call failed.
    #[error("Ledger call failed: {0}")]
    Ledger(#[from] LedgerError),
}
