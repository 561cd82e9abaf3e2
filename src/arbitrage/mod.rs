//! Arbitrage Module
//!
//! Optimal trade sizing for a pool pair, and best-opportunity selection
//! across the pools of a watchlist group.
//!
//! Created: 2026-10-17

pub mod optimal_size;
pub mod selector;

pub use optimal_size::{OptimalSize, OptimalSizeCalculator, SizingConfig, DEFAULT_MIN_QUOTE_LIQUIDITY};
pub use selector::{scan_parallel, OpportunitySelector};
