//! Pool Synchronization
//!
//! The reserve-fetch seam: anything that can read `(reserve0, reserve1)` for a
//! list of pools at one block implements [`ReserveFetcher`].
//!
//! Created: 2026-10-17

use alloy::primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::HashMap;

/// Reserves for a set of pools, all read at `block_number`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub block_number: u64,
    pub reserves: HashMap<Address, (BigUint, BigUint)>,
}

impl ReserveSnapshot {
    pub fn new(block_number: u64) -> Self {
        Self {
            block_number,
            reserves: HashMap::new(),
        }
    }

    pub fn insert(&mut self, pool: Address, reserve0: BigUint, reserve1: BigUint) {
        self.reserves.insert(pool, (reserve0, reserve1));
    }

    pub fn get(&self, pool: &Address) -> Option<&(BigUint, BigUint)> {
        self.reserves.get(pool)
    }

    pub fn len(&self) -> usize {
        self.reserves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserves.is_empty()
    }
}

/// Source of pool reserves
#[async_trait]
pub trait ReserveFetcher: Send + Sync {
    /// Current block number of the underlying chain view
    async fn block_number(&self) -> Result<u64>;

    /// Reserves of every pool in `pools`, read at a single block
    async fn fetch_reserves(&self, pools: &[Address]) -> Result<ReserveSnapshot>;
}

/// Fixed reserves, served at whatever block the snapshot was taken.
/// Used for offline scans from snapshot files.
#[derive(Debug, Clone, Default)]
pub struct StaticReserveFetcher {
    snapshot: ReserveSnapshot,
}

impl StaticReserveFetcher {
    pub fn new(snapshot: ReserveSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ReserveFetcher for StaticReserveFetcher {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.snapshot.block_number)
    }

    async fn fetch_reserves(&self, pools: &[Address]) -> Result<ReserveSnapshot> {
        let mut snapshot = ReserveSnapshot::new(self.snapshot.block_number);
        for pool in pools {
            if let Some((r0, r1)) = self.snapshot.get(pool) {
                snapshot.insert(*pool, r0.clone(), r1.clone());
            }
        }
        Ok(snapshot)
    }
}
