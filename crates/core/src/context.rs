//! Per-transaction call context.

use bundlr_types::{Address, BlockHeight, Hash};
use serde::{Deserialize, Serialize};

/// What the host tells a contract about the transaction being applied.
///
/// Contracts never read clocks or randomness themselves; everything that
/// varies between transactions arrives through this struct, which keeps
/// re-evaluation of the same history deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallContext {
    /// The principal that signed the transaction.
    pub caller: Address,

    /// Id of the contract being invoked. Stake is custodied under this address.
    pub contract: Address,

    /// Height of the block containing the transaction.
    pub height: BlockHeight,

    /// Unpredictable per-block value supplied by the host platform.
    pub anchor: Hash,
}

impl CallContext {
    /// Create a context.
    pub fn new(caller: Address, contract: Address, height: BlockHeight, anchor: Hash) -> Self {
        Self {
            caller,
            contract,
            height,
            anchor,
        }
    }

    /// Same transaction context, different signer.
    pub fn with_caller(&self, caller: Address) -> Self {
        Self {
            caller,
            ..self.clone()
        }
    }
}
