//! Bundler pool contract.
//!
//! Bundlers join by locking a flat stake with the pool and leave through a
//! timed exit (see [`bundlr_membership`]). On top of membership the pool
//! keeps an admission list of principals allowed to administer it, and can
//! pull slashing verdicts from the validator committee with `syncSlash`.
//!
//! The pool is driven through the [`Contract`](bundlr_core::Contract) trait:
//! [`Action`]s mutate, [`Query`]s project.

mod action;
mod admission;
mod config;
mod error;
mod pool;

pub use action::{Action, Query, Response};
pub use admission::AdmissionList;
pub use config::BundlersConfig;
pub use error::BundlersError;
pub use pool::BundlerPool;
