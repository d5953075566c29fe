//! Pool configuration.

use bundlr_types::{Address, Amount, BlockCount};
use serde::{Deserialize, Serialize};

/// Default number of blocks between `leave` and a permitted `withdraw`.
pub const DEFAULT_WITHDRAW_DELAY: BlockCount = BlockCount(10);

/// How much stake a member must lock on `join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StakeRequirement {
    /// Every member locks exactly this amount; any offered stake is ignored.
    Flat(Amount),
    /// Members choose their stake, which must be at least this amount.
    Minimum(Amount),
}

impl StakeRequirement {
    /// The flat stake or the minimum.
    pub fn amount(&self) -> Amount {
        match self {
            StakeRequirement::Flat(amount) | StakeRequirement::Minimum(amount) => *amount,
        }
    }
}

/// How much of a member's stake a slash takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForfeitPolicy {
    /// The whole stake; the member is removed.
    #[default]
    Full,
    /// A share of the stake in basis points. The member stays unless its
    /// stake reaches zero.
    Fraction {
        /// Share taken, out of 10_000.
        basis_points: u16,
    },
}

impl ForfeitPolicy {
    /// Amount forfeited from a member holding `stake`.
    pub fn amount_for(&self, stake: Amount) -> Amount {
        match self {
            ForfeitPolicy::Full => stake,
            ForfeitPolicy::Fraction { basis_points } => stake.share_bps(*basis_points),
        }
    }
}

/// Where forfeited stake goes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForfeitDestination {
    /// Stays in the pool contract's custody.
    #[default]
    Retain,
    /// Burned through the token ledger.
    Burn,
    /// Transferred to a treasury address.
    Treasury(Address),
}

/// Configuration of one membership pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    /// Token contract the stake is denominated in. Fixed at deploy.
    pub token: Address,

    /// Stake locked on `join`.
    pub stake: StakeRequirement,

    /// Blocks between `leave` and a permitted `withdraw`.
    #[serde(default = "default_withdraw_delay")]
    pub withdraw_delay: BlockCount,

    /// Share of stake taken by a slash.
    #[serde(default)]
    pub forfeit: ForfeitPolicy,

    /// Where forfeited stake goes.
    #[serde(default)]
    pub forfeit_destination: ForfeitDestination,
}

fn default_withdraw_delay() -> BlockCount {
    DEFAULT_WITHDRAW_DELAY
}

impl PoolConfig {
    /// Pool where every member locks `stake`.
    pub fn flat(token: Address, stake: Amount) -> Self {
        Self::new(token, StakeRequirement::Flat(stake))
    }

    /// Pool where members lock at least `minimum`.
    pub fn minimum(token: Address, minimum: Amount) -> Self {
        Self::new(token, StakeRequirement::Minimum(minimum))
    }

    fn new(token: Address, stake: StakeRequirement) -> Self {
        Self {
            token,
            stake,
            withdraw_delay: DEFAULT_WITHDRAW_DELAY,
            forfeit: ForfeitPolicy::default(),
            forfeit_destination: ForfeitDestination::default(),
        }
    }

    /// Set the exit delay.
    pub fn with_withdraw_delay(mut self, delay: BlockCount) -> Self {
        self.withdraw_delay = delay;
        self
    }

    /// Set the forfeit policy.
    pub fn with_forfeit(mut self, policy: ForfeitPolicy) -> Self {
        self.forfeit = policy;
        self
    }

    /// Set where forfeited stake goes.
    pub fn with_forfeit_destination(mut self, destination: ForfeitDestination) -> Self {
        self.forfeit_destination = destination;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forfeit_amounts() {
        assert_eq!(ForfeitPolicy::Full.amount_for(Amount(70)), Amount(70));
        assert_eq!(
            ForfeitPolicy::Fraction { basis_points: 2_500 }.amount_for(Amount(100)),
            Amount(25)
        );
    }

    #[test]
    fn test_config_defaults_fill_in_when_deserializing() {
        let json = r#"{ "token": "tok", "stake": { "flat": "5" } }"#;
        let config: PoolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.withdraw_delay, DEFAULT_WITHDRAW_DELAY);
        assert_eq!(config.forfeit, ForfeitPolicy::Full);
        assert_eq!(config.forfeit_destination, ForfeitDestination::Retain);
        assert_eq!(config.stake, StakeRequirement::Flat(Amount(5)));
    }
}
