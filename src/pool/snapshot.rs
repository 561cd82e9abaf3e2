//! Pool Snapshot Files
//!
//! JSON snapshots of pool state, written by `watch` and replayed offline by
//! `scan`. Amounts and addresses are stored as strings so values beyond
//! 2^64 survive any JSON reader.
//!
//! Created: 2026-10-17

use super::syncer::ReserveSnapshot;
use super::watchlist::group_name;
use crate::types::{ArbitrageOpportunity, DexType, FeeRatio, PoolState};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable pool state for JSON storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializablePoolState {
    pub address: String,
    pub dex: DexType,
    pub token0: String,
    pub token1: String,
    pub reserve0: String,
    pub reserve1: String,
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    pub last_updated: u64,
}

impl From<&PoolState> for SerializablePoolState {
    fn from(pool: &PoolState) -> Self {
        Self {
            address: format!("{:?}", pool.address),
            dex: pool.dex,
            token0: format!("{:?}", pool.token0),
            token1: format!("{:?}", pool.token1),
            reserve0: pool.reserve0.to_string(),
            reserve1: pool.reserve1.to_string(),
            fee_numerator: pool.fee.numerator(),
            fee_denominator: pool.fee.denominator(),
            last_updated: pool.last_updated,
        }
    }
}

impl SerializablePoolState {
    /// Convert back to PoolState
    pub fn to_pool_state(&self) -> Result<PoolState> {
        let address = parse_address(&self.address, "address")?;
        let token0 = parse_address(&self.token0, "token0")?;
        let token1 = parse_address(&self.token1, "token1")?;
        let fee = FeeRatio::new(self.fee_numerator, self.fee_denominator)
            .with_context(|| format!("Invalid fee for pool {}", self.address))?;

        let reserve0 = parse_amount(&self.reserve0)
            .with_context(|| format!("Invalid reserve0 for pool {}", self.address))?;
        let reserve1 = parse_amount(&self.reserve1)
            .with_context(|| format!("Invalid reserve1 for pool {}", self.address))?;

        Ok(PoolState::new(address, self.dex, token0, token1, fee)
            .with_reserves(reserve0, reserve1, self.last_updated))
    }
}

/// Snapshot file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshotFile {
    /// Wall-clock time the reserves were captured
    pub captured_at: DateTime<Utc>,
    /// Block the reserves were read at
    pub block_number: u64,
    pub pools: Vec<SerializablePoolState>,
}

impl PoolSnapshotFile {
    pub fn capture(block_number: u64, pools: &[PoolState]) -> Self {
        Self {
            captured_at: Utc::now(),
            block_number,
            pools: pools.iter().map(SerializablePoolState::from).collect(),
        }
    }

    /// Pool states, failing on the first malformed entry
    pub fn to_pool_states(&self) -> Result<Vec<PoolState>> {
        self.pools.iter().map(SerializablePoolState::to_pool_state).collect()
    }

    /// Reserves of every pool, as if fetched at `block_number`
    pub fn reserve_snapshot(&self) -> Result<ReserveSnapshot> {
        let mut snapshot = ReserveSnapshot::new(self.block_number);
        for pool in self.to_pool_states()? {
            snapshot.insert(pool.address, pool.reserve0, pool.reserve1);
        }
        Ok(snapshot)
    }

    /// Write to JSON file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize pool snapshot")?;

        // Write to temp file first, then rename (atomic)
        let temp_path = path.as_ref().with_extension("tmp");
        std::fs::write(&temp_path, &json).context("Failed to write temp file")?;
        std::fs::rename(&temp_path, path.as_ref()).context("Failed to rename temp file")?;

        Ok(())
    }

    /// Read from JSON file
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read snapshot file {}", path.as_ref().display()))?;
        let snapshot: Self = serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;
        Ok(snapshot)
    }

    /// Age of the snapshot in seconds
    pub fn age_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.captured_at).num_seconds()
    }
}

/// JSON form of an opportunity, as printed by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub group: String,
    pub buy_pool: String,
    pub buy_dex: DexType,
    pub sell_pool: String,
    pub sell_dex: DexType,
    pub quote_token: String,
    pub base_token: String,
    pub amount_quote: String,
    pub expected_base: String,
    pub estimated_profit_quote: String,
    pub block_number: u64,
}

impl OpportunityRecord {
    pub fn new(opp: &ArbitrageOpportunity) -> Self {
        Self {
            group: group_name(&opp.buy_pool),
            buy_pool: format!("{:?}", opp.buy_pool.address),
            buy_dex: opp.buy_pool.dex,
            sell_pool: format!("{:?}", opp.sell_pool.address),
            sell_dex: opp.sell_pool.dex,
            quote_token: format!("{:?}", opp.quote_token),
            base_token: format!("{:?}", opp.base_token),
            amount_quote: opp.amount_quote.to_string(),
            expected_base: opp.expected_base_amount().to_string(),
            estimated_profit_quote: opp.estimated_profit_quote.to_string(),
            block_number: opp.buy_pool.last_updated.max(opp.sell_pool.last_updated),
        }
    }
}

fn parse_address(value: &str, field: &str) -> Result<Address> {
    value
        .parse::<Address>()
        .with_context(|| format!("Invalid {} '{}'", field, value))
}

/// Parse a non-negative decimal integer of any size
pub fn parse_amount(value: &str) -> Result<BigUint> {
    value
        .trim()
        .parse::<BigUint>()
        .with_context(|| format!("Invalid amount '{}'", value))
}
