//! Stake-gated membership engine.
//!
//! A pool of members, each of which has locked a stake with the pool's
//! contract through the token ledger. The same engine backs the bundler pool
//! (flat stake) and the validator committee (minimum stake plus an endpoint
//! per validator); the per-member payload is a type parameter.
//!
//! # Lifecycle
//!
//! ```text
//!            join                leave                     withdraw
//!  Absent ─────────▶ Active ─────────────▶ PendingExit(h) ─────────────▶ Absent
//!                      │                        │         (height >= h)
//!                      └──── forfeit ───────────┘
//!                     (stake only; Absent once it reaches zero)
//! ```
//!
//! Stake stays in the contract's custody from `join` until `withdraw`.

mod config;
mod engine;
mod error;
mod member;

pub use config::{
    ForfeitDestination, ForfeitPolicy, PoolConfig, StakeRequirement, DEFAULT_WITHDRAW_DELAY,
};
pub use engine::{Forfeiture, MembershipEngine};
pub use error::MembershipError;
pub use member::{ExitState, Member};
