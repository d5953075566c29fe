//! Genesis configuration.

use bundlr_bundlers::BundlersConfig;
use bundlr_types::{Address, Amount, Hash};
use bundlr_validators::{Ratio, ValidatorsConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors loading or checking a genesis configuration.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Invalid genesis TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Two parts of the configuration disagree about a contract address.
    #[error("{field} is {found}, expected {expected}")]
    Mismatch {
        field: &'static str,
        expected: Address,
        found: Address,
    },

    /// A threshold with a zero denominator or above one.
    #[error("{field} is {numerator}/{denominator}, expected a fraction in [0, 1]")]
    InvalidRatio {
        field: &'static str,
        numerator: u64,
        denominator: u64,
    },
}

/// Addresses the three contracts are deployed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployments {
    pub token: Address,
    pub bundlers: Address,
    pub validators: Address,
}

/// Initial token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGenesis {
    pub ticker: String,
    #[serde(default)]
    pub balances: BTreeMap<Address, Amount>,
}

/// Everything needed to start a chain.
///
/// # Example
///
/// ```toml
/// [deployments]
/// token = "token"
/// bundlers = "bundlers"
/// validators = "validators"
///
/// [token]
/// ticker = "BND"
/// balances = { alice = "100", v00 = "1000" }
///
/// [bundlers]
/// owner = "owner"
/// validatorsContract = "validators"
/// pool = { token = "token", stake = { flat = "1" }, withdrawDelay = 3 }
///
/// [validators]
/// bundler = "bundler"
/// bundlersContract = "bundlers"
/// pool = { token = "token", stake = { minimum = "10" } }
/// epoch = { duration = 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub deployments: Deployments,
    pub token: TokenGenesis,
    pub bundlers: BundlersConfig,
    pub validators: ValidatorsConfig,

    /// Anchor of the genesis block; every later anchor chains from it.
    #[serde(default)]
    pub genesis_anchor: Hash,
}

impl ChainConfig {
    /// Assemble a configuration.
    pub fn new(
        deployments: Deployments,
        token: TokenGenesis,
        bundlers: BundlersConfig,
        validators: ValidatorsConfig,
    ) -> Self {
        Self {
            deployments,
            token,
            bundlers,
            validators,
            genesis_anchor: Hash::ZERO,
        }
    }

    /// Set the genesis anchor.
    pub fn with_genesis_anchor(mut self, anchor: Hash) -> Self {
        self.genesis_anchor = anchor;
        self
    }

    /// Parse and check a TOML genesis file.
    pub fn from_toml(source: &str) -> Result<Self, GenesisError> {
        let config: ChainConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the contracts point at each other and at the deployed token,
    /// and that the slashing thresholds are proper fractions.
    pub fn validate(&self) -> Result<(), GenesisError> {
        let d = &self.deployments;
        expect("bundlers.pool.token", &d.token, &self.bundlers.pool.token)?;
        expect("validators.pool.token", &d.token, &self.validators.pool.token)?;
        expect(
            "validators.bundlersContract",
            &d.bundlers,
            &self.validators.bundlers_contract,
        )?;
        if let Some(source) = &self.bundlers.validators_contract {
            expect("bundlers.validatorsContract", &d.validators, source)?;
        }
        let slashing = &self.validators.slashing;
        fraction("validators.slashing.quorum", slashing.quorum)?;
        fraction(
            "validators.slashing.expiryParticipation",
            slashing.expiry_participation,
        )?;
        Ok(())
    }
}

fn fraction(field: &'static str, ratio: Ratio) -> Result<(), GenesisError> {
    if ratio.is_valid() {
        Ok(())
    } else {
        Err(GenesisError::InvalidRatio {
            field,
            numerator: ratio.numerator,
            denominator: ratio.denominator,
        })
    }
}

fn expect(field: &'static str, expected: &Address, found: &Address) -> Result<(), GenesisError> {
    if expected == found {
        Ok(())
    } else {
        Err(GenesisError::Mismatch {
            field,
            expected: expected.clone(),
            found: found.clone(),
        })
    }
}
