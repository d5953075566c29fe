//! Validator records.

use bundlr_membership::Member;
use bundlr_types::Url;
use serde::{Deserialize, Serialize};

/// Per-validator data kept alongside the stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Where the validator serves requests.
    pub url: Url,
}

/// A present validator.
pub type Validator = Member<ValidatorInfo>;
