//! Pool management module
//!
//! Handles pool state storage, reserve synchronization, discovery,
//! watchlist grouping and constant-product swap math.
//!
//! Created: 2026-10-17

pub mod calculator;
pub mod snapshot;
pub mod state;
pub mod syncer;
pub mod v2_syncer;
pub mod watchlist;

pub use calculator::PriceCalculator;
pub use snapshot::{parse_amount, OpportunityRecord, PoolSnapshotFile, SerializablePoolState};
pub use state::PoolStateManager;
pub use syncer::{ReserveFetcher, ReserveSnapshot, StaticReserveFetcher};
pub use v2_syncer::{DiscoveryConfig, PairDiscovery, UniswapQueryFetcher};
pub use watchlist::{build_watchlist, group_name};
