//! Deterministic host for the bundling network contracts.
//!
//! A single-threaded chain that orders submitted transactions into blocks,
//! supplies the block height and a per-block anchor, and applies every
//! transaction atomically against the token ledger and the two contracts.
//! Given the same genesis and the same log, it produces identical state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Chain                           │
//! │                                                         │
//! │  submit() ──▶ mempool ──mine()──▶ Block{height, anchor} │
//! │                                        │                │
//! │                                        ▼                │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  World { ledger, bundlers, validators }            │ │
//! │  │  each tx applied to a clone, committed on success  │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  receipts + snapshots: OrdMap<BlockHeight, World>       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The `bundlr-replay` binary rebuilds a chain from a genesis TOML file and a
//! JSON transaction log and prints projections at any height.

mod call;
mod chain;
mod genesis;
mod host;
mod workload;
mod world;

pub use call::{Call, ChainQuery, ChainResponse, TokenAction, TokenQuery, TokenResponse, Transaction};
pub use chain::{Block, Chain, ChainError, Receipt, TransactionLog};
pub use genesis::{ChainConfig, Deployments, GenesisError, TokenGenesis};
pub use host::ChainHost;
pub use workload::{MembershipWorkload, WorkloadConfig};
pub use world::{CallError, World};
