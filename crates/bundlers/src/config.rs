//! Bundler pool configuration.

use bundlr_membership::PoolConfig;
use bundlr_types::{Address, Amount, BlockCount};
use serde::{Deserialize, Serialize};

/// Deploy-time configuration of a bundler pool.
///
/// # Example
///
/// ```toml
/// owner = "owner-wallet"
/// validatorsContract = "validators"
///
/// [pool]
/// token = "token"
/// stake = { flat = "1000" }
/// withdrawDelay = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlersConfig {
    /// Pool owner; implicitly on the admission list.
    pub owner: Address,

    /// Membership parameters. The stake requirement should be flat.
    pub pool: PoolConfig,

    /// Interactors enumerated at deploy.
    #[serde(default)]
    pub allowed_interactors: Vec<Address>,

    /// Validator committee whose verdicts `syncSlash` applies.
    #[serde(default)]
    pub validators_contract: Option<Address>,

    /// Require `join` callers to pass the admission check.
    #[serde(default)]
    pub gate_join: bool,
}

impl BundlersConfig {
    /// Pool owned by `owner` with a flat `stake` in `token`.
    pub fn new(owner: Address, token: Address, stake: Amount) -> Self {
        Self {
            owner,
            pool: PoolConfig::flat(token, stake),
            allowed_interactors: Vec::new(),
            validators_contract: None,
            gate_join: false,
        }
    }

    /// Set the exit delay.
    pub fn with_withdraw_delay(mut self, delay: BlockCount) -> Self {
        self.pool = self.pool.with_withdraw_delay(delay);
        self
    }

    /// Replace the membership parameters.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set the validator committee verdicts are read from.
    pub fn with_validators_contract(mut self, contract: Address) -> Self {
        self.validators_contract = Some(contract);
        self
    }

    /// Set the deploy-time interactors.
    pub fn with_allowed_interactors(mut self, interactors: Vec<Address>) -> Self {
        self.allowed_interactors = interactors;
        self
    }

    /// Gate `join` on the admission list.
    pub fn with_gate_join(mut self, gate_join: bool) -> Self {
        self.gate_join = gate_join;
        self
    }
}
