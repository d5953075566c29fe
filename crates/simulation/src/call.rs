//! Transactions and queries addressed to the deployed contracts.

use bundlr_types::{Address, Amount, Hash};
use serde::{Deserialize, Serialize};

/// Calls to the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum TokenAction {
    Transfer { to: Address, amount: Amount },
    TransferFrom { from: Address, to: Address, amount: Amount },
    /// Set (not add to) the spender's allowance. Zero revokes it.
    Approve { spender: Address, amount: Amount },
    Burn { amount: Amount },
}

/// Read-only token ledger projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum TokenQuery {
    BalanceOf { owner: Address },
    Allowance { owner: Address, spender: Address },
    TotalSupply,
    Ticker,
}

/// Values returned by the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Amount(Amount),
    Ticker(String),
}

/// A call to one of the deployed contracts.
///
/// Serialized as `{"contract": "...", "input": {"function": "...", ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "contract", content = "input")]
pub enum Call {
    Token(TokenAction),
    Bundlers(bundlr_bundlers::Action),
    Validators(bundlr_validators::Action),
}

/// A query against one of the deployed contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "contract", content = "input")]
pub enum ChainQuery {
    Token(TokenQuery),
    Bundlers(bundlr_bundlers::Query),
    Validators(bundlr_validators::Query),
}

/// Result value of a call or query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChainResponse {
    Token(TokenResponse),
    Bundlers(bundlr_bundlers::Response),
    Validators(bundlr_validators::Response),
}

/// A signed call, as ordered into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub caller: Address,
    pub call: Call,
}

impl Transaction {
    pub fn new(caller: Address, call: Call) -> Self {
        Self { caller, call }
    }

    /// Canonical JSON encoding of the call.
    pub fn encode_call(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.call)
    }

    /// Content digest, independent of where the transaction lands.
    pub fn digest(&self) -> Result<Hash, serde_json::Error> {
        let call = self.encode_call()?;
        Ok(Hash::from_parts(&[self.caller.as_bytes(), &[0], &call]))
    }

    /// Id of the transaction at `index` in the block with `anchor`.
    pub fn id(&self, anchor: &Hash, index: u32) -> Result<Hash, serde_json::Error> {
        let call = self.encode_call()?;
        Ok(Hash::from_parts(&[
            anchor.as_bytes(),
            &index.to_le_bytes(),
            self.caller.as_bytes(),
            &[0],
            &call,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlr_test_helpers::addr;

    #[test]
    fn test_call_envelope_json() {
        let call: Call = serde_json::from_str(
            r#"{"contract":"bundlers","input":{"function":"join"}}"#,
        )
        .unwrap();
        assert_eq!(call, Call::Bundlers(bundlr_bundlers::Action::Join));

        let approve = Call::Token(TokenAction::Approve {
            spender: addr("bundlers"),
            amount: Amount(5),
        });
        assert_eq!(
            serde_json::to_value(&approve).unwrap(),
            serde_json::json!({
                "contract": "token",
                "input": { "function": "approve", "spender": "bundlers", "amount": "5" }
            })
        );
    }

    #[test]
    fn test_id_depends_on_position() {
        let tx = Transaction::new(addr("alice"), Call::Bundlers(bundlr_bundlers::Action::Leave));
        let anchor = Hash::from_bytes(b"block");
        assert_ne!(tx.id(&anchor, 0).unwrap(), tx.id(&anchor, 1).unwrap());
        assert_ne!(
            tx.id(&anchor, 0).unwrap(),
            tx.id(&Hash::ZERO, 0).unwrap()
        );
        assert_eq!(tx.digest().unwrap(), tx.digest().unwrap());
    }
}
