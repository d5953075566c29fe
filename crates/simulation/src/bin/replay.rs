//! Bundling network replay CLI
//!
//! Rebuilds a chain from a genesis file and a transaction log, then prints
//! projections or receipts. Can also generate a randomized log.

use anyhow::{bail, Context, Result};
use bundlr_simulation::{
    Chain, ChainConfig, ChainQuery, MembershipWorkload, TransactionLog, WorkloadConfig,
};
use bundlr_types::{Address, BlockHeight};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bundlr-replay")]
#[command(about = "Deterministic replay for the bundling network contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a log and evaluate a query
    Query {
        /// Genesis configuration (TOML)
        #[arg(long)]
        genesis: PathBuf,

        /// Transaction log (JSON); omit to query genesis state
        #[arg(long)]
        log: Option<PathBuf>,

        /// Height to query at (defaults to the tip)
        #[arg(long)]
        at: Option<u64>,

        /// JSON query, or `contract.function` for queries without arguments
        query: String,
    },

    /// Replay a log and print every receipt
    Receipts {
        #[arg(long)]
        genesis: PathBuf,

        #[arg(long)]
        log: PathBuf,
    },

    /// Generate a randomized log from genesis and print it
    Simulate {
        #[arg(long)]
        genesis: PathBuf,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of blocks to mine
        #[arg(long, default_value = "100")]
        blocks: u64,

        /// Transactions per block
        #[arg(long, default_value = "10")]
        batch_size: usize,

        /// Fraction of slashing traffic (0.0 to 1.0)
        #[arg(long, default_value = "0.2")]
        slash_ratio: f64,
    },
}

fn load_genesis(path: &Path) -> Result<ChainConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading genesis {}", path.display()))?;
    ChainConfig::from_toml(&source).with_context(|| format!("parsing genesis {}", path.display()))
}

fn load_chain(genesis: &Path, log: Option<&Path>) -> Result<Chain> {
    let config = load_genesis(genesis)?;
    let log = match log {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading log {}", path.display()))?;
            serde_json::from_str::<TransactionLog>(&source)
                .with_context(|| format!("parsing log {}", path.display()))?
        }
        None => TransactionLog::default(),
    };
    Ok(Chain::replay(config, &log)?)
}

/// Accept a full JSON query or the `contract.function` shorthand.
fn parse_query(input: &str) -> Result<ChainQuery> {
    let input = input.trim();
    if input.starts_with('{') {
        return serde_json::from_str(input).context("parsing JSON query");
    }
    let Some((contract, function)) = input.split_once('.') else {
        bail!("query must be JSON or contract.function, got {input:?}");
    };
    let envelope = serde_json::json!({
        "contract": contract,
        "input": { "function": function },
    });
    serde_json::from_value(envelope).with_context(|| format!("unknown query {input:?}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            genesis,
            log,
            at,
            query,
        } => {
            let query = parse_query(&query)?;
            let chain = load_chain(&genesis, log.as_deref())?;
            let response = chain.query(&query, at.map(BlockHeight))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Receipts { genesis, log } => {
            let chain = load_chain(&genesis, Some(&log))?;
            println!("{}", serde_json::to_string_pretty(chain.receipts())?);
        }

        Commands::Simulate {
            genesis,
            seed,
            blocks,
            batch_size,
            slash_ratio,
        } => {
            if !(0.0..=1.0).contains(&slash_ratio) {
                bail!("--slash-ratio must be between 0.0 and 1.0, got {slash_ratio}");
            }
            let config = load_genesis(&genesis)?;
            let deployments = config.deployments.clone();
            let contracts = [&deployments.token, &deployments.bundlers, &deployments.validators];
            let accounts: Vec<Address> = config
                .token
                .balances
                .keys()
                .filter(|holder| !contracts.contains(holder))
                .cloned()
                .collect();
            let workload_config = WorkloadConfig::new(accounts, config.bundlers.owner.clone())
                .with_batch_size(batch_size)
                .with_slash_ratio(slash_ratio);

            let mut chain = Chain::new(config)?;
            let mut workload = MembershipWorkload::new(workload_config, deployments);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            for _ in 0..blocks {
                for tx in workload.generate_batch(&mut rng) {
                    chain.submit_transaction(tx);
                }
                chain.mine()?;
            }

            let accepted = chain.receipts().iter().filter(|r| r.is_success()).count();
            info!(
                seed,
                blocks,
                transactions = chain.receipts().len(),
                accepted,
                "Simulation complete"
            );
            println!("{}", serde_json::to_string_pretty(&chain.log())?);
        }
    }

    Ok(())
}
