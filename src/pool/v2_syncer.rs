//! V2 Pool Synchronization
//!
//! Reserve fetching and pair discovery for Uniswap V2 style factories,
//! both served by the batch query contract (one RPC call per batch instead
//! of one per pool).
//!
//! Created: 2026-10-17

use super::syncer::{ReserveFetcher, ReserveSnapshot};
use crate::contracts::IUniswapFlashQuery;
use crate::math::u256_to_biguint;
use crate::types::{Market, PoolState};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::BlockId;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fetches reserves for known pools through `getReservesByPairs`
pub struct UniswapQueryFetcher<P> {
    provider: Arc<P>,
    query_contract: Address,
    batch_size: usize,
}

impl<P: Provider + 'static> UniswapQueryFetcher<P> {
    pub fn new(provider: Arc<P>, query_contract: Address, batch_size: usize) -> Self {
        Self {
            provider,
            query_contract,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl<P: Provider + 'static> ReserveFetcher for UniswapQueryFetcher<P> {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to get block number")
    }

    /// All batches are pinned to the block read first, so every pair in the
    /// snapshot comes from the same chain state.
    async fn fetch_reserves(&self, pools: &[Address]) -> Result<ReserveSnapshot> {
        let block = self.block_number().await?;
        let query = IUniswapFlashQuery::new(self.query_contract, self.provider.clone());
        let mut snapshot = ReserveSnapshot::new(block);

        for batch in pools.chunks(self.batch_size) {
            let rows = query
                .getReservesByPairs(batch.to_vec())
                .block(BlockId::number(block))
                .call()
                .await
                .with_context(|| format!("getReservesByPairs failed for {} pairs at block {}", batch.len(), block))?;

            merge_reserve_rows(&mut snapshot, batch, &rows)?;
        }

        debug!("Fetched reserves for {} pools at block {}", snapshot.len(), block);
        Ok(snapshot)
    }
}

/// Zip one `getReservesByPairs` response with the batch it answers
fn merge_reserve_rows(snapshot: &mut ReserveSnapshot, batch: &[Address], rows: &[[U256; 3]]) -> Result<()> {
    if rows.len() != batch.len() {
        bail!(
            "getReservesByPairs returned {} rows for {} pairs",
            rows.len(),
            batch.len()
        );
    }
    for (pool, row) in batch.iter().zip(rows) {
        snapshot.insert(*pool, u256_to_biguint(row[0]), u256_to_biguint(row[1]));
    }
    Ok(())
}

/// Discovery limits for paging through a factory's pair list
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Pairs requested per `getPairsByIndexRange` call
    pub batch_size: u64,
    /// Maximum number of calls per factory
    pub batch_count_limit: u64,
    /// Pools holding any of these tokens are never tracked
    pub blacklist_tokens: HashSet<Address>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_count_limit: 100,
            blacklist_tokens: HashSet::new(),
        }
    }
}

/// Consecutive failed batches after which a factory is abandoned
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Run of failed discovery batches for one factory
#[derive(Debug, Default)]
struct FailureStreak {
    count: u32,
}

impl FailureStreak {
    /// Record a failed batch; true once the factory should be abandoned
    fn fail(&mut self) -> bool {
        self.count += 1;
        self.count >= MAX_CONSECUTIVE_FAILURES
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Enumerates the pairs of every configured factory that trade against the quote token
pub struct PairDiscovery<P> {
    provider: Arc<P>,
    query_contract: Address,
    config: DiscoveryConfig,
}

impl<P: Provider + 'static> PairDiscovery<P> {
    pub fn new(provider: Arc<P>, query_contract: Address, config: DiscoveryConfig) -> Self {
        Self {
            provider,
            query_contract,
            config,
        }
    }

    /// Discover pools (with zero reserves) across `markets`.
    ///
    /// A failed batch is logged and skipped; paging stops at the first short
    /// batch, after `batch_count_limit` calls, or after
    /// [`MAX_CONSECUTIVE_FAILURES`] failed batches in a row.
    pub async fn discover(&self, markets: &[Market], quote_token: Address) -> Vec<PoolState> {
        let query = IUniswapFlashQuery::new(self.query_contract, self.provider.clone());
        let mut pools = Vec::new();

        for market in markets {
            let before = pools.len();
            let mut failures = FailureStreak::default();

            for batch in 0..self.config.batch_count_limit {
                let start = batch * self.config.batch_size;
                let stop = start + self.config.batch_size;

                let rows = match query
                    .getPairsByIndexRange(market.factory, U256::from(start), U256::from(stop))
                    .call()
                    .await
                {
                    Ok(rows) => {
                        failures.reset();
                        rows
                    }
                    Err(e) => {
                        error!(
                            "getPairsByIndexRange({:?}, {}, {}) failed: {}",
                            market.factory, start, stop, e
                        );
                        if failures.fail() {
                            warn!(
                                "Giving up on factory {:?} after {} consecutive failed batches",
                                market.factory, MAX_CONSECUTIVE_FAILURES
                            );
                            break;
                        }
                        continue;
                    }
                };

                pools.extend(pools_from_pair_rows(
                    &rows,
                    market,
                    quote_token,
                    &self.config.blacklist_tokens,
                ));

                if (rows.len() as u64) < self.config.batch_size {
                    break;
                }
            }

            info!(
                "{} factory {:?}: {} pools against quote token",
                market.dex,
                market.factory,
                pools.len() - before
            );
        }

        pools
    }
}

/// Turn `[token0, token1, pair]` rows into pools trading against `quote_token`
fn pools_from_pair_rows(
    rows: &[[Address; 3]],
    market: &Market,
    quote_token: Address,
    blacklist: &HashSet<Address>,
) -> Vec<PoolState> {
    rows.iter()
        .filter_map(|&[token0, token1, pair]| {
            let base = if token0 == quote_token {
                token1
            } else if token1 == quote_token {
                token0
            } else {
                return None;
            };
            if blacklist.contains(&base) {
                return None;
            }
            Some(PoolState::new(pair, market.dex, token0, token1, market.fee))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DexType, FeeRatio};
    use num_bigint::BigUint;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn market() -> Market {
        Market {
            dex: DexType::Sushiswap,
            factory: addr(0xF0),
            fee: FeeRatio::UNISWAP_V2,
        }
    }

    #[test]
    fn test_pools_from_pair_rows_filters_quote_and_blacklist() {
        let weth = addr(0xEE);
        let rows = vec![
            [addr(0x01), weth, addr(0xA1)], // quote in slot 1
            [weth, addr(0x02), addr(0xA2)], // quote in slot 0
            [addr(0x03), addr(0x04), addr(0xA3)], // no quote
            [addr(0x05), weth, addr(0xA4)], // blacklisted base
        ];
        let blacklist: HashSet<Address> = [addr(0x05)].into_iter().collect();

        let pools = pools_from_pair_rows(&rows, &market(), weth, &blacklist);

        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].address, addr(0xA1));
        assert_eq!(pools[0].token0, addr(0x01));
        assert_eq!(pools[0].token1, weth);
        assert_eq!(pools[1].address, addr(0xA2));
        assert!(pools.iter().all(|p| p.dex == DexType::Sushiswap && !p.has_liquidity()));
    }

    #[test]
    fn test_merge_reserve_rows() {
        let mut snapshot = ReserveSnapshot::new(7);
        let batch = [addr(0xA1), addr(0xA2)];
        let rows = [
            [U256::from(10u64), U256::from(20u64), U256::from(1u64)],
            [U256::from(30u64), U256::from(40u64), U256::from(1u64)],
        ];

        merge_reserve_rows(&mut snapshot, &batch, &rows).unwrap();
        assert_eq!(
            snapshot.get(&addr(0xA2)),
            Some(&(BigUint::from(30u32), BigUint::from(40u32)))
        );

        let short = merge_reserve_rows(&mut snapshot, &batch, &rows[..1]);
        assert!(short.is_err());
    }

    #[test]
    fn test_discovery_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.batch_count_limit, 100);
    }

    #[test]
    fn test_failure_streak_abandons_after_consecutive_failures() {
        let mut streak = FailureStreak::default();
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(!streak.fail());
        }
        assert!(streak.fail());

        // A successful batch in between restarts the count
        let mut streak = FailureStreak::default();
        assert!(!streak.fail());
        streak.reset();
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(!streak.fail());
        }
        assert!(streak.fail());
    }
}
