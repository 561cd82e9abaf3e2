//! Pool State Management
//!
//! Thread-safe storage for pool states using DashMap.
//!
//! Created: 2026-10-17

use super::syncer::ReserveSnapshot;
use crate::types::PoolState;
use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe pool state manager
///
/// Uses DashMap for concurrent read/write access to pool states.
/// Keyed by pool address. Readers always get owned copies, so a snapshot
/// handed to the engine never changes underneath it.
#[derive(Debug)]
pub struct PoolStateManager {
    pools: Arc<DashMap<Address, PoolState>>,
}

impl PoolStateManager {
    /// Create a new empty PoolStateManager
    pub fn new() -> Self {
        Self {
            pools: Arc::new(DashMap::new()),
        }
    }

    /// Add or update a pool state
    pub fn update_pool(&self, pool: PoolState) {
        debug!(
            "Updating pool {:?} on {} - reserves: ({}, {})",
            pool.address, pool.dex, pool.reserve0, pool.reserve1
        );
        self.pools.insert(pool.address, pool);
    }

    /// Register discovered pools without touching ones already tracked
    pub fn register_pools(&self, pools: impl IntoIterator<Item = PoolState>) {
        for pool in pools {
            self.pools.entry(pool.address).or_insert(pool);
        }
    }

    /// Replace reserves of every tracked pool present in `snapshot`.
    /// Returns the number of pools updated; untracked addresses are ignored.
    pub fn apply_snapshot(&self, snapshot: &ReserveSnapshot) -> usize {
        let mut updated = 0;
        for (address, (reserve0, reserve1)) in &snapshot.reserves {
            if let Some(mut entry) = self.pools.get_mut(address) {
                let fresh = entry.with_reserves(reserve0.clone(), reserve1.clone(), snapshot.block_number);
                *entry = fresh;
                updated += 1;
            }
        }
        debug!(
            "Applied reserves for {} pools at block {}",
            updated, snapshot.block_number
        );
        updated
    }

    /// Get pool state by address
    pub fn get_pool(&self, address: &Address) -> Option<PoolState> {
        self.pools.get(address).map(|entry| entry.clone())
    }

    /// Get all pool states
    pub fn get_all_pools(&self) -> Vec<PoolState> {
        self.pools.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Addresses of every tracked pool
    pub fn addresses(&self) -> Vec<Address> {
        self.pools.iter().map(|entry| *entry.key()).collect()
    }

    /// Check if any pool data is stale (more than `max_blocks` old)
    pub fn is_stale(&self, current_block: u64, max_blocks: u64) -> bool {
        self.pools
            .iter()
            .any(|entry| current_block.saturating_sub(entry.value().last_updated) > max_blocks)
    }

    /// Get statistics: (pool_count, oldest_block, newest_block)
    pub fn stats(&self) -> (usize, u64, u64) {
        let count = self.pools.len();
        let min_block = self
            .pools
            .iter()
            .map(|entry| entry.value().last_updated)
            .min()
            .unwrap_or(0);
        let max_block = self
            .pools
            .iter()
            .map(|entry| entry.value().last_updated)
            .max()
            .unwrap_or(0);

        (count, min_block, max_block)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Default for PoolStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PoolStateManager {
    fn clone(&self) -> Self {
        Self {
            pools: Arc::clone(&self.pools),
        }
    }
}
