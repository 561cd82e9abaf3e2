//! Scan Cycle
//!
//! One evaluation pass: pull reserves for every tracked pool, rebuild the
//! watchlist, and size every group in parallel. `scan` runs it once against
//! a snapshot file, `watch` runs it on every new block.
//!
//! Created: 2026-10-17

use crate::arbitrage::{scan_parallel, OpportunitySelector};
use crate::config::EngineConfig;
use crate::contracts::IERC20;
use crate::math::u256_to_biguint;
use crate::pool::{build_watchlist, PoolStateManager, ReserveFetcher};
use crate::types::ArbitrageOpportunity;
use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{bail, Context, Result};
use num_bigint::BigUint;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the per-cycle trading budget comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetSource {
    Fixed(BigUint),
    /// Quote-token balance held by the executor contract
    ExecutorBalance { token: Address, executor: Address },
}

impl BudgetSource {
    /// Executor balance when an executor is configured, else the fixed budget
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        match (config.executor_address, &config.budget) {
            (Some(executor), _) => Ok(BudgetSource::ExecutorBalance {
                token: config.quote_token,
                executor,
            }),
            (None, Some(budget)) => Ok(BudgetSource::Fixed(budget.clone())),
            (None, None) => bail!("No budget configured: set network.executor_address or engine.budget_wei"),
        }
    }

    pub async fn current<P: Provider + 'static>(&self, provider: &Arc<P>) -> Result<BigUint> {
        match self {
            BudgetSource::Fixed(budget) => Ok(budget.clone()),
            BudgetSource::ExecutorBalance { token, executor } => {
                let erc20 = IERC20::new(*token, provider.clone());
                let balance = erc20
                    .balanceOf(*executor)
                    .call()
                    .await
                    .with_context(|| format!("Failed to read balance of {:?}", executor))?;
                Ok(u256_to_biguint(balance))
            }
        }
    }
}

/// Outcome of one scan cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub block_number: u64,
    pub pools_updated: usize,
    pub groups: usize,
    pub opportunities: Vec<ArbitrageOpportunity>,
}

/// Reserve source, pool state and selector wired together
pub struct ScanEngine<F> {
    fetcher: F,
    state: PoolStateManager,
    selector: Arc<OpportunitySelector>,
    blacklist: HashSet<Address>,
    min_profit: BigUint,
}

impl<F: ReserveFetcher> ScanEngine<F> {
    pub fn new(
        fetcher: F,
        state: PoolStateManager,
        selector: OpportunitySelector,
        blacklist: HashSet<Address>,
        min_profit: BigUint,
    ) -> Self {
        Self {
            fetcher,
            state,
            selector: Arc::new(selector),
            blacklist,
            min_profit,
        }
    }

    pub fn state(&self) -> &PoolStateManager {
        &self.state
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Refresh reserves, then find the best opportunity in every group
    pub async fn run_cycle(&self, budget: &BigUint) -> Result<CycleReport> {
        let addresses = self.state.addresses();
        let snapshot = self
            .fetcher
            .fetch_reserves(&addresses)
            .await
            .context("Reserve fetch failed")?;
        let pools_updated = self.state.apply_snapshot(&snapshot);

        let pools = self.state.get_all_pools();
        let watchlist = build_watchlist(&pools, self.selector.quote_token(), &self.blacklist);
        let groups = watchlist.len();
        debug!(
            "Block {}: {} pools refreshed, {} groups to scan",
            snapshot.block_number, pools_updated, groups
        );

        let opportunities = scan_parallel(
            Arc::clone(&self.selector),
            watchlist,
            budget.clone(),
            self.min_profit.clone(),
        )
        .await;

        if !opportunities.is_empty() {
            info!(
                "Block {}: {} opportunities across {} groups",
                snapshot.block_number,
                opportunities.len(),
                groups
            );
        }

        Ok(CycleReport {
            block_number: snapshot.block_number,
            pools_updated,
            groups,
            opportunities,
        })
    }
}
