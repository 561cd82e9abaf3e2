//! dexarb-engine
//!
//! Command-line entry point.
//! - `scan`: size every opportunity in a pool snapshot file, print JSON
//! - `watch`: discover pools, then re-evaluate on every new block until Ctrl-C
//!
//! Logs go to stderr (`RUST_LOG` overrides the configured level, `--json`
//! switches to structured output); results go to stdout.
//!
//! Created: 2026-10-17

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dexarb_engine::arbitrage::{OpportunitySelector, OptimalSizeCalculator, SizingConfig};
use dexarb_engine::config::{load_config, EngineConfig};
use dexarb_engine::engine::{BudgetSource, ScanEngine};
use dexarb_engine::pool::{
    parse_amount, OpportunityRecord, PairDiscovery, PoolSnapshotFile, PoolStateManager, ReserveFetcher,
    StaticReserveFetcher, UniswapQueryFetcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Constant-product AMM arbitrage sizing engine
#[derive(Parser)]
#[command(name = "dexarb-engine", version)]
struct Cli {
    /// TOML configuration file (defaults to built-in mainnet settings)
    #[arg(short, long, env = "DEXARB_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a pool snapshot file offline
    Scan {
        /// Snapshot JSON written by `watch --snapshot-out`
        #[arg(long)]
        snapshot: PathBuf,
        /// Trading budget in quote-token wei (overrides engine.budget_wei)
        #[arg(long)]
        budget: Option<String>,
        /// Minimum profit in quote-token wei (overrides engine.min_profit_wei)
        #[arg(long)]
        min_profit: Option<String>,
    },
    /// Track pools live and evaluate on every new block
    Watch {
        /// Write a pool snapshot after each evaluated block
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_level, cli.json);
    info!("Config loaded: {}", config.summary());

    match cli.command {
        Command::Scan {
            snapshot,
            budget,
            min_profit,
        } => run_scan(&config, snapshot, budget, min_profit).await,
        Command::Watch { snapshot_out } => run_watch(&config, snapshot_out).await,
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn selector(config: &EngineConfig) -> OpportunitySelector {
    let calculator = OptimalSizeCalculator::new(SizingConfig {
        min_quote_liquidity: config.min_quote_liquidity.clone(),
    });
    OpportunitySelector::new(calculator, config.quote_token)
}

async fn run_scan(
    config: &EngineConfig,
    snapshot_path: PathBuf,
    budget: Option<String>,
    min_profit: Option<String>,
) -> Result<()> {
    let file = PoolSnapshotFile::read_from_file(&snapshot_path)?;
    info!(
        "Loaded {} pools at block {} ({}s old)",
        file.pools.len(),
        file.block_number,
        file.age_secs()
    );

    let budget = match budget {
        Some(b) => parse_amount(&b).context("--budget")?,
        None => config
            .budget
            .clone()
            .context("No budget: pass --budget or set engine.budget_wei")?,
    };
    let min_profit = match min_profit {
        Some(p) => parse_amount(&p).context("--min-profit")?,
        None => config.min_profit.clone(),
    };

    let state = PoolStateManager::new();
    state.register_pools(file.to_pool_states()?);

    let engine = ScanEngine::new(
        StaticReserveFetcher::new(file.reserve_snapshot()?),
        state,
        selector(config),
        config.discovery.blacklist_tokens.clone(),
        min_profit,
    );
    let report = engine.run_cycle(&budget).await?;

    let records: Vec<OpportunityRecord> = report.opportunities.iter().map(OpportunityRecord::new).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&records).context("Failed to serialize opportunities")?
    );
    Ok(())
}

async fn run_watch(config: &EngineConfig, snapshot_out: Option<PathBuf>) -> Result<()> {
    let rpc_url = config.rpc_url.as_deref().context("RPC_URL not set")?;
    let budget_source = BudgetSource::from_config(config)?;

    let provider = ProviderBuilder::new()
        .connect(rpc_url)
        .await
        .context("Failed to connect to RPC")?;
    let provider = Arc::new(provider);
    let block = provider.get_block_number().await.context("Failed to get block number")?;
    info!("Connected! Current block: {}", block);

    let discovery = PairDiscovery::new(Arc::clone(&provider), config.query_contract, config.discovery.clone());
    let pools = discovery.discover(&config.markets, config.quote_token).await;
    info!("Discovered {} pools against {:?}", pools.len(), config.quote_token);

    let state = PoolStateManager::new();
    state.register_pools(pools);

    let engine = ScanEngine::new(
        UniswapQueryFetcher::new(Arc::clone(&provider), config.query_contract, config.reserve_batch_size),
        state,
        selector(config),
        config.discovery.blacklist_tokens.clone(),
        config.min_profit.clone(),
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut last_block = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = interval.tick() => {}
        }

        let block = match engine.fetcher().block_number().await {
            Ok(block) => block,
            Err(e) => {
                warn!("Block poll failed: {:#}", e);
                continue;
            }
        };
        if block <= last_block {
            continue;
        }

        let budget = match budget_source.current(&provider).await {
            Ok(budget) => budget,
            Err(e) => {
                warn!("Budget lookup failed at block {}: {:#}", block, e);
                continue;
            }
        };

        match engine.run_cycle(&budget).await {
            Ok(report) => {
                last_block = block;
                for opp in &report.opportunities {
                    match serde_json::to_string(&OpportunityRecord::new(opp)) {
                        Ok(json) => println!("{}", json),
                        Err(e) => warn!("Failed to serialize opportunity: {}", e),
                    }
                }
                if let Some(path) = &snapshot_out {
                    let capture = PoolSnapshotFile::capture(report.block_number, &engine.state().get_all_pools());
                    if let Err(e) = capture.write_to_file(path) {
                        warn!("Snapshot write failed: {:#}", e);
                    }
                }
            }
            Err(e) => error!("Cycle at block {} failed: {:#}", block, e),
        }
    }

    let (count, oldest, newest) = engine.state().stats();
    info!("Stopped: {} pools tracked (blocks {} - {})", count, oldest, newest);
    Ok(())
}
