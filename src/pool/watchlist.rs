//! Watchlist construction: groups pools that trade the same token pair.
//!
//! Created: 2026-10-17

use crate::types::{PoolState, WatchlistGroup};
use alloy::primitives::Address;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Canonical group name for a pool: both token addresses, sorted, joined by "-"
pub fn group_name(pool: &PoolState) -> String {
    let (low, high) = pool.pair_key();
    format!("{:?}-{:?}", low, high)
}

/// Group pools by unordered token pair.
///
/// Only pools holding `quote_token` whose other token is not blacklisted are
/// considered. Groups with a single pool cannot be arbitraged and are dropped.
/// Groups come back sorted by name, pools in input order.
pub fn build_watchlist(
    pools: &[PoolState],
    quote_token: Address,
    blacklist: &HashSet<Address>,
) -> Vec<WatchlistGroup> {
    let mut grouped: BTreeMap<String, Vec<PoolState>> = BTreeMap::new();

    for pool in pools {
        let Some(base) = pool.other_token(quote_token) else {
            continue;
        };
        if blacklist.contains(&base) {
            continue;
        }
        grouped.entry(group_name(pool)).or_default().push(pool.clone());
    }

    let total = grouped.len();
    let watchlist: Vec<WatchlistGroup> = grouped
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(name, members)| WatchlistGroup::new(name, members))
        .collect();

    debug!(
        "Watchlist: {} of {} token pairs have more than one pool",
        watchlist.len(),
        total
    );
    watchlist
}
