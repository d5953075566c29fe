//! Validator committee configuration.

use crate::epoch::EpochConfig;
use crate::slashing::SlashingConfig;
use bundlr_membership::PoolConfig;
use bundlr_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Deploy-time configuration of a validator committee.
///
/// # Example
///
/// ```toml
/// bundler = "bundler-wallet"
/// bundlersContract = "bundlers"
///
/// [pool]
/// token = "token"
/// stake = { minimum = "1000" }
///
/// [epoch]
/// duration = 100
/// maxNominated = 10
///
/// [slashing]
/// quorum = { numerator = 1, denominator = 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorsConfig {
    /// Bundler identity this committee validates.
    pub bundler: Address,

    /// Bundler pool contract the committee's verdicts feed.
    pub bundlers_contract: Address,

    /// Membership parameters. The stake requirement should be a minimum.
    pub pool: PoolConfig,

    #[serde(default)]
    pub epoch: EpochConfig,

    #[serde(default)]
    pub slashing: SlashingConfig,

    /// Refuse `leave` from validators on the current nominated committee.
    #[serde(default)]
    pub lock_nominated: bool,
}

impl ValidatorsConfig {
    /// Committee with a `minimum_stake` in `token` and default epoch and
    /// slashing parameters.
    pub fn new(
        bundler: Address,
        bundlers_contract: Address,
        token: Address,
        minimum_stake: Amount,
    ) -> Self {
        Self {
            bundler,
            bundlers_contract,
            pool: PoolConfig::minimum(token, minimum_stake),
            epoch: EpochConfig::default(),
            slashing: SlashingConfig::default(),
            lock_nominated: false,
        }
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_epoch(mut self, epoch: EpochConfig) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_slashing(mut self, slashing: SlashingConfig) -> Self {
        self.slashing = slashing;
        self
    }

    pub fn with_lock_nominated(mut self, lock: bool) -> Self {
        self.lock_nominated = lock;
        self
    }
}
