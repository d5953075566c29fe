//! Validator committee contract.
//!
//! Validators join by locking at least the minimum stake and registering an
//! endpoint URL. Every `epoch_duration` blocks anyone may call `updateEpoch`,
//! which resamples a bounded committee of nominated validators from the
//! Active set, seeded by the per-block anchor the host supplies.
//!
//! Validators can propose slashing a misbehaving identity with a piece of
//! evidence and vote on open proposals. A proposal closes once enough of the
//! Active weight has voted; a "slash" outcome forfeits the accused's stake
//! (if it is a validator) and is published as a [`SlashVerdict`] that the
//! bundler pool applies with `syncSlash`.
//!
//! ```text
//!  proposeSlash ──▶ Open(votes) ──voteSlash──▶ quorum? ──yes──▶ Closed(outcome)
//!                       │                                          │
//!                       └─ lifetime elapsed, swept by updateEpoch ─┘
//! ```
//!
//! [`SlashVerdict`]: bundlr_core::SlashVerdict

mod action;
mod committee;
mod config;
mod epoch;
mod error;
mod evidence;
mod sampler;
mod slashing;
mod validator;

pub use action::{Action, Query, Response};
pub use committee::ValidatorCommittee;
pub use config::ValidatorsConfig;
pub use epoch::{Epoch, EpochConfig, DEFAULT_EPOCH_DURATION, DEFAULT_MAX_NOMINATED};
pub use error::ValidatorsError;
pub use evidence::{Evidence, EvidenceError};
pub use sampler::sample_committee;
pub use slashing::{
    CloseReason, Outcome, Ratio, SlashProposal, SlashingConfig, Tally, Vote, VoteWeighting,
    Voting,
};
pub use validator::{Validator, ValidatorInfo};
