//! Bundler pool call surface.

use bundlr_membership::Forfeiture;
use bundlr_types::{Address, Amount, BlockCount, BlockHeight};
use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Mutating calls, tagged by `"function"` as in interaction inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum Action {
    /// Lock the flat stake and become a bundler.
    Join,
    /// Start the timed exit.
    Leave,
    /// Collect the stake once the exit delay elapsed.
    Withdraw,
    /// Admin: enumerate a new interactor.
    AddAllowedInteractor { interactor: Address },
    /// Admin: drop an enumerated interactor.
    RemoveAllowedInteractor { interactor: Address },
    /// Admin: apply new slashing verdicts from the validator committee.
    SyncSlash,
}

/// Read-only projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "function")]
pub enum Query {
    /// Present bundlers: `null` while Active, the exit height once leaving.
    Bundlers,
    AllowedInteractors,
    WithdrawDelay,
    Stake,
    Token,
    Owner,
    /// Total stake taken by slashing.
    Forfeited,
}

/// Values returned by actions and queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum Response {
    Bundlers(OrdMap<Address, Option<BlockHeight>>),
    AllowedInteractors(Vec<Address>),
    WithdrawDelay(BlockCount),
    Stake(Amount),
    Token(Address),
    Owner(Address),
    Forfeited(Amount),
    /// Result of `leave`.
    ExitHeight(BlockHeight),
    /// Result of `syncSlash`.
    Slashed(Vec<Forfeiture>),
}
