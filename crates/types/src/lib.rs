//! Value types for the bundling network contracts.
//!
//! Everything here is plain data: addresses, token amounts, block heights
//! and hashes. All types serialize to JSON-friendly representations so that
//! contract state can be snapshotted and replayed.

mod address;
mod amount;
mod hash;
mod identifiers;

pub use address::{Address, AddressError};
pub use amount::{Amount, BPS_DENOMINATOR};
pub use hash::{Hash, HexError};
pub use identifiers::{BlockCount, BlockHeight, EvidenceId};

/// Validator endpoint URL.
pub use url::Url;
