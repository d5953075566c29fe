//! Misbehavior evidence submitted with `proposeSlash`.

use bundlr_types::{Address, EvidenceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A receipt the accused signed but did not honor.
///
/// The signature is carried as-is; checking it is the submitter's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// External id, e.g. the undelivered transaction. Keys the proposal.
    pub id: EvidenceId,
    /// Size of the data in bytes.
    pub size: u64,
    /// Fee paid, as a decimal string.
    pub fee: String,
    pub currency: String,
    /// Deadline block on the target chain.
    pub block: String,
    /// Accused identity.
    pub validator: Address,
    pub signature: String,
}

/// Structural problems with submitted evidence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    #[error("Evidence field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("Evidence size must be positive")]
    ZeroSize,

    #[error("Evidence fee {0:?} is not a non-negative decimal")]
    InvalidFee(String),
}

impl Evidence {
    /// Check the fields are well-formed. Does not verify the signature.
    pub fn validate(&self) -> Result<(), EvidenceError> {
        let required = [
            ("id", self.id.as_str()),
            ("currency", self.currency.as_str()),
            ("block", self.block.as_str()),
            ("signature", self.signature.as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(EvidenceError::EmptyField(*name));
        }
        if self.size == 0 {
            return Err(EvidenceError::ZeroSize);
        }
        if self.fee.is_empty() || !self.fee.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EvidenceError::InvalidFee(self.fee.clone()));
        }
        Ok(())
    }
}
