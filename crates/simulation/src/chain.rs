//! Block production, receipts, historical snapshots and replay.

use crate::call::{Call, ChainQuery, ChainResponse, Transaction};
use crate::genesis::{ChainConfig, GenesisError};
use crate::world::World;
use bundlr_core::transact;
use bundlr_types::{Address, BlockHeight, Hash};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from driving or replaying a chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Genesis(#[from] GenesisError),

    #[error("Failed to encode transaction: {0}")]
    Encode(#[from] serde_json::Error),

    /// No snapshot exists at this height.
    #[error("Unknown height {0}")]
    UnknownHeight(BlockHeight),

    /// A replayed log skipped or repeated a height.
    #[error("Expected block at height {expected}, found {found}")]
    HeightGap {
        expected: BlockHeight,
        found: BlockHeight,
    },

    /// A replayed block's anchor does not match its contents.
    #[error("Anchor mismatch at height {height}: computed {computed}, logged {logged}")]
    AnchorMismatch {
        height: BlockHeight,
        computed: Hash,
        logged: Hash,
    },
}

/// An ordered batch of transactions executed at one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub height: BlockHeight,
    pub anchor: Hash,
    pub transactions: Vec<Transaction>,
}

/// Every block since genesis, in order. Replaying it reproduces the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub blocks: Vec<Block>,
}

/// Outcome of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Hash,
    pub height: BlockHeight,
    pub index: u32,
    pub caller: Address,
    /// Rejected transactions carry the error message and changed nothing.
    pub result: Result<Option<ChainResponse>, String>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Anchor of the block at `height` following a block anchored at `prev`.
///
/// Commits to the transactions' content digests, not their ids, since ids
/// themselves depend on the anchor.
fn block_anchor(
    prev: &Hash,
    height: BlockHeight,
    transactions: &[Transaction],
) -> Result<Hash, serde_json::Error> {
    let digests = transactions
        .iter()
        .map(|tx| tx.digest().map(Hash::to_bytes))
        .collect::<Result<Vec<_>, _>>()?;
    let height_bytes = height.0.to_le_bytes();

    let mut parts: Vec<&[u8]> = Vec::with_capacity(digests.len() + 2);
    parts.push(prev.as_bytes());
    parts.push(&height_bytes);
    parts.extend(digests.iter().map(|d| d.as_slice()));
    Ok(Hash::from_parts(&parts))
}

/// Single-threaded deterministic chain.
///
/// Transactions are queued with [`Chain::submit`] and executed in submission
/// order when [`Chain::mine`] seals the next block. Each transaction runs
/// against a clone of the world that is committed only if it succeeds.
pub struct Chain {
    config: ChainConfig,
    world: World,
    height: BlockHeight,
    anchor: Hash,
    mempool: Vec<Transaction>,
    blocks: Vec<Block>,
    receipts: Vec<Receipt>,
    /// World state after each sealed block, genesis included.
    snapshots: OrdMap<BlockHeight, World>,
}

impl Chain {
    /// Start a chain from genesis.
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;
        let world = World::genesis(&config);
        let anchor = config.genesis_anchor;

        info!(
            ticker = %config.token.ticker,
            holders = config.token.balances.len(),
            anchor = %anchor,
            "Chain started at genesis"
        );

        Ok(Self {
            snapshots: OrdMap::unit(BlockHeight::GENESIS, world.clone()),
            config,
            world,
            height: BlockHeight::GENESIS,
            anchor,
            mempool: Vec::new(),
            blocks: Vec::new(),
            receipts: Vec::new(),
        })
    }

    /// Rebuild a chain by re-executing every block of `log`.
    ///
    /// Heights must be contiguous from 1 and every logged anchor must match
    /// the one recomputed from the block contents.
    pub fn replay(config: ChainConfig, log: &TransactionLog) -> Result<Self, ChainError> {
        let mut chain = Self::new(config)?;
        for block in &log.blocks {
            let expected = chain.height.next();
            if block.height != expected {
                return Err(ChainError::HeightGap {
                    expected,
                    found: block.height,
                });
            }
            let computed = block_anchor(&chain.anchor, block.height, &block.transactions)?;
            if computed != block.anchor {
                return Err(ChainError::AnchorMismatch {
                    height: block.height,
                    computed,
                    logged: block.anchor,
                });
            }
            chain.seal(block.height, computed, block.transactions.clone())?;
        }
        info!(height = chain.height.0, "Replay complete");
        Ok(chain)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Block production
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue a call for the next block.
    pub fn submit(&mut self, caller: Address, call: Call) {
        self.submit_transaction(Transaction::new(caller, call));
    }

    /// Queue a transaction for the next block.
    pub fn submit_transaction(&mut self, tx: Transaction) {
        debug!(caller = %tx.caller, pending = self.mempool.len() + 1, "Transaction submitted");
        self.mempool.push(tx);
    }

    /// Seal the next block from everything pending and execute it.
    ///
    /// Returns the receipts of the block's transactions.
    pub fn mine(&mut self) -> Result<&[Receipt], ChainError> {
        let height = self.height.next();
        let transactions = std::mem::take(&mut self.mempool);
        let anchor = block_anchor(&self.anchor, height, &transactions)?;
        let first = self.receipts.len();
        self.seal(height, anchor, transactions)?;
        Ok(&self.receipts[first..])
    }

    /// Mine (possibly empty) blocks until the chain reaches `height`.
    pub fn mine_until(&mut self, height: BlockHeight) -> Result<(), ChainError> {
        while self.height < height {
            self.mine()?;
        }
        Ok(())
    }

    /// Submit a single call, mine it in its own block and return its receipt.
    pub fn execute(&mut self, caller: Address, call: Call) -> Result<Receipt, ChainError> {
        self.submit(caller, call);
        let receipts = self.mine()?;
        // The mempool may have held earlier submissions; ours is last.
        Ok(receipts[receipts.len() - 1].clone())
    }

    fn seal(
        &mut self,
        height: BlockHeight,
        anchor: Hash,
        transactions: Vec<Transaction>,
    ) -> Result<(), ChainError> {
        let mut rejected = 0usize;
        for (index, tx) in transactions.iter().enumerate() {
            let index = index as u32;
            let id = tx.id(&anchor, index)?;
            let deployments = &self.config.deployments;
            let result = transact(&mut self.world, |world| {
                world.execute(deployments, &tx.caller, tx.call.clone(), height, anchor)
            });

            if let Err(error) = &result {
                rejected += 1;
                debug!(id = %id, caller = %tx.caller, error = %error, "Transaction rejected");
            } else {
                debug!(id = %id, caller = %tx.caller, "Transaction applied");
            }

            self.receipts.push(Receipt {
                id,
                height,
                index,
                caller: tx.caller.clone(),
                result: result.map_err(|e| e.to_string()),
            });
        }

        info!(
            height = height.0,
            anchor = %anchor,
            transactions = transactions.len(),
            rejected,
            "Block sealed"
        );

        self.height = height;
        self.anchor = anchor;
        self.snapshots.insert(height, self.world.clone());
        self.blocks.push(Block {
            height,
            anchor,
            transactions,
        });
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Evaluate a query at `at`, or at the tip if `None`.
    pub fn query(
        &self,
        query: &ChainQuery,
        at: Option<BlockHeight>,
    ) -> Result<ChainResponse, ChainError> {
        let world = match at {
            Some(height) => self.world_at(height)?,
            None => &self.world,
        };
        Ok(world.query(query))
    }

    /// World state as of the end of block `height`.
    pub fn world_at(&self, height: BlockHeight) -> Result<&World, ChainError> {
        self.snapshots
            .get(&height)
            .ok_or(ChainError::UnknownHeight(height))
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn anchor(&self) -> Hash {
        self.anchor
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.mempool
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// The log of every sealed block.
    pub fn log(&self) -> TransactionLog {
        TransactionLog {
            blocks: self.blocks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{TokenAction, TokenQuery, TokenResponse};
    use crate::genesis::{Deployments, TokenGenesis};
    use bundlr_bundlers::BundlersConfig;
    use bundlr_test_helpers::{addr, TEST_TICKER};
    use bundlr_types::Amount;
    use bundlr_validators::ValidatorsConfig;
    use std::collections::BTreeMap;
    use tracing_test::traced_test;

    fn config() -> ChainConfig {
        let deployments = Deployments {
            token: addr("token"),
            bundlers: addr("bundlers"),
            validators: addr("validators"),
        };
        let token = TokenGenesis {
            ticker: TEST_TICKER.to_string(),
            balances: BTreeMap::from([(addr("alice"), Amount(100))]),
        };
        let bundlers = BundlersConfig::new(addr("owner"), addr("token"), Amount(1));
        let validators =
            ValidatorsConfig::new(addr("bundler"), addr("bundlers"), addr("token"), Amount(10));
        ChainConfig::new(deployments, token, bundlers, validators)
    }

    fn balance(chain: &Chain, name: &str, at: Option<BlockHeight>) -> Amount {
        let query = ChainQuery::Token(TokenQuery::BalanceOf { owner: addr(name) });
        match chain.query(&query, at).unwrap() {
            ChainResponse::Token(TokenResponse::Amount(amount)) => amount,
            other => panic!("unexpected response {other:?}"),
        }
    }

    fn transfer(to: &str, amount: u128) -> Call {
        Call::Token(TokenAction::Transfer {
            to: addr(to),
            amount: Amount(amount),
        })
    }

    #[traced_test]
    #[test]
    fn test_empty_blocks_advance_height_and_anchor() {
        let mut chain = Chain::new(config()).unwrap();
        assert_eq!(chain.height(), BlockHeight(0));

        chain.mine().unwrap();
        let first = chain.anchor();
        chain.mine().unwrap();

        assert_eq!(chain.height(), BlockHeight(2));
        assert_ne!(first, chain.anchor());
        assert_ne!(first, Hash::ZERO);
    }

    #[traced_test]
    #[test]
    fn test_transactions_execute_in_submission_order() {
        let mut chain = Chain::new(config()).unwrap();
        chain.submit(addr("alice"), transfer("bob", 60));
        chain.submit(addr("alice"), transfer("carol", 60));
        chain.submit(addr("bob"), transfer("carol", 10));

        let receipts = chain.mine().unwrap().to_vec();
        assert_eq!(receipts.len(), 3);
        assert!(receipts[0].is_success());
        assert!(!receipts[1].is_success());
        assert!(receipts[2].is_success());
        assert_eq!(receipts[1].index, 1);

        assert_eq!(balance(&chain, "alice", None), Amount(40));
        assert_eq!(balance(&chain, "bob", None), Amount(50));
        assert_eq!(balance(&chain, "carol", None), Amount(10));
    }

    #[traced_test]
    #[test]
    fn test_rejected_transaction_leaves_world_unchanged() {
        let mut chain = Chain::new(config()).unwrap();
        let before = chain.world().clone();

        let receipt = chain.execute(addr("bob"), transfer("alice", 1)).unwrap();

        assert!(receipt.result.is_err());
        assert_eq!(chain.world(), &before);
        assert_eq!(chain.height(), BlockHeight(1));
    }

    #[traced_test]
    #[test]
    fn test_historical_queries_use_snapshots() {
        let mut chain = Chain::new(config()).unwrap();
        chain.execute(addr("alice"), transfer("bob", 30)).unwrap();
        chain.execute(addr("alice"), transfer("bob", 30)).unwrap();

        assert_eq!(balance(&chain, "bob", Some(BlockHeight(0))), Amount(0));
        assert_eq!(balance(&chain, "bob", Some(BlockHeight(1))), Amount(30));
        assert_eq!(balance(&chain, "bob", None), Amount(60));
        assert!(matches!(
            chain.world_at(BlockHeight(9)),
            Err(ChainError::UnknownHeight(BlockHeight(9)))
        ));
    }

    #[traced_test]
    #[test]
    fn test_replay_rejects_tampered_log() {
        let mut chain = Chain::new(config()).unwrap();
        chain.execute(addr("alice"), transfer("bob", 30)).unwrap();
        chain.mine().unwrap();

        let mut tampered = chain.log();
        tampered.blocks[0].transactions[0] =
            Transaction::new(addr("alice"), transfer("bob", 31));
        assert!(matches!(
            Chain::replay(config(), &tampered),
            Err(ChainError::AnchorMismatch { height: BlockHeight(1), .. })
        ));

        let mut gap = chain.log();
        gap.blocks.remove(0);
        assert!(matches!(
            Chain::replay(config(), &gap),
            Err(ChainError::HeightGap { .. })
        ));
    }
}
