//! The replicated state: token ledger plus both contracts.

use crate::call::{Call, ChainQuery, ChainResponse, TokenAction, TokenQuery, TokenResponse};
use crate::genesis::{ChainConfig, Deployments};
use crate::host::ChainHost;
use bundlr_bundlers::{BundlerPool, BundlersError};
use bundlr_core::{CallContext, Contract, LedgerError, MemoryLedger, TokenLedger};
use bundlr_types::{Address, BlockHeight, Hash};
use bundlr_validators::{ValidatorCommittee, ValidatorsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error(transparent)]
    Token(#[from] LedgerError),

    #[error(transparent)]
    Bundlers(#[from] BundlersError),

    #[error(transparent)]
    Validators(#[from] ValidatorsError),
}

/// Materialized state of every deployed contract.
///
/// Cloning is cheap: all collections inside are persistent maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    pub ledger: MemoryLedger,
    pub bundlers: BundlerPool,
    pub validators: ValidatorCommittee,
}

impl World {
    /// State at genesis.
    pub fn genesis(config: &ChainConfig) -> Self {
        Self {
            ledger: MemoryLedger::with_balances(
                config.token.ticker.clone(),
                config
                    .token
                    .balances
                    .iter()
                    .map(|(owner, amount)| (owner.clone(), *amount)),
            ),
            bundlers: BundlerPool::new(config.bundlers.clone()),
            validators: ValidatorCommittee::new(config.validators.clone()),
        }
    }

    /// Apply one call. Not atomic on its own: the chain runs this on a clone.
    pub fn execute(
        &mut self,
        deployments: &Deployments,
        caller: &Address,
        call: Call,
        height: BlockHeight,
        anchor: Hash,
    ) -> Result<Option<ChainResponse>, CallError> {
        match call {
            Call::Token(action) => {
                self.execute_token(caller, action)?;
                Ok(None)
            }
            Call::Bundlers(action) => {
                let ctx =
                    CallContext::new(caller.clone(), deployments.bundlers.clone(), height, anchor);
                let mut host = ChainHost::new(&mut self.ledger)
                    .with_source(&deployments.validators, &self.validators);
                let response = self.bundlers.apply(&ctx, &mut host, action)?;
                Ok(response.map(ChainResponse::Bundlers))
            }
            Call::Validators(action) => {
                let ctx = CallContext::new(
                    caller.clone(),
                    deployments.validators.clone(),
                    height,
                    anchor,
                );
                let mut host = ChainHost::new(&mut self.ledger);
                let response = self.validators.apply(&ctx, &mut host, action)?;
                Ok(response.map(ChainResponse::Validators))
            }
        }
    }

    fn execute_token(&mut self, caller: &Address, action: TokenAction) -> Result<(), LedgerError> {
        match action {
            TokenAction::Transfer { to, amount } => self.ledger.transfer(caller, &to, amount),
            TokenAction::TransferFrom { from, to, amount } => {
                self.ledger.transfer_from(caller, &from, &to, amount)
            }
            TokenAction::Approve { spender, amount } => {
                self.ledger.approve(caller, &spender, amount);
                Ok(())
            }
            TokenAction::Burn { amount } => self.ledger.burn(caller, amount),
        }
    }

    /// Evaluate a projection.
    pub fn query(&self, query: &ChainQuery) -> ChainResponse {
        match query {
            ChainQuery::Token(query) => ChainResponse::Token(match query {
                TokenQuery::BalanceOf { owner } => {
                    TokenResponse::Amount(self.ledger.balance_of(owner))
                }
                TokenQuery::Allowance { owner, spender } => {
                    TokenResponse::Amount(self.ledger.allowance(owner, spender))
                }
                TokenQuery::TotalSupply => TokenResponse::Amount(self.ledger.total_supply()),
                TokenQuery::Ticker => TokenResponse::Ticker(self.ledger.ticker().to_owned()),
            }),
            ChainQuery::Bundlers(query) => ChainResponse::Bundlers(self.bundlers.query(query)),
            ChainQuery::Validators(query) => {
                ChainResponse::Validators(self.validators.query(query))
            }
        }
    }
}
