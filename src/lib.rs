//! DEX Arbitrage Sizing Engine
//!
//! Exact big-integer sizing of two-pool arbitrage on constant-product
//! (Uniswap V2 style) pools, best-opportunity selection per token pair,
//! and the reserve-fetch / discovery plumbing that feeds it.
//!
//! Created: 2026-10-17

pub mod arbitrage;
pub mod config;
pub mod contracts;
pub mod engine;
pub mod math;
pub mod pool;
pub mod types;

// Re-export commonly used types
pub use arbitrage::{scan_parallel, OpportunitySelector, OptimalSize, OptimalSizeCalculator, SizingConfig};
pub use config::{load_config, EngineConfig};
pub use engine::{BudgetSource, CycleReport, ScanEngine};
pub use math::{isqrt, MathError};
pub use pool::{PoolStateManager, PriceCalculator, ReserveFetcher, ReserveSnapshot};
pub use types::{ArbitrageOpportunity, DexType, FeeRatio, Market, PoolState, WatchlistGroup};
