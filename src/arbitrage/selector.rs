//! Opportunity Selector
//!
//! Sizes every ordered pool pair inside a watchlist group and keeps the
//! single most profitable trade that clears the profit threshold.
//! Groups are independent, so a whole watchlist can be scanned in parallel
//! on the blocking pool.
//!
//! Created: 2026-10-17

use super::optimal_size::OptimalSizeCalculator;
use crate::types::{ArbitrageOpportunity, WatchlistGroup};
use alloy::primitives::Address;
use futures::future::join_all;
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Picks the best opportunity within a group of pools sharing a token pair
#[derive(Debug, Clone)]
pub struct OpportunitySelector {
    calculator: OptimalSizeCalculator,
    quote_token: Address,
}

impl OpportunitySelector {
    pub fn new(calculator: OptimalSizeCalculator, quote_token: Address) -> Self {
        Self {
            calculator,
            quote_token,
        }
    }

    pub fn quote_token(&self) -> Address {
        self.quote_token
    }

    pub fn calculator(&self) -> &OptimalSizeCalculator {
        &self.calculator
    }

    /// Best opportunity in `group`, or `None` if no ordered pair makes at
    /// least `min_profit`.
    ///
    /// Pairs are visited as (i, j) then (j, i) for every i < j; on equal
    /// profit the first one visited is kept.
    pub fn select_best(
        &self,
        group: &WatchlistGroup,
        budget: &BigUint,
        min_profit: &BigUint,
    ) -> Option<ArbitrageOpportunity> {
        let mut best: Option<ArbitrageOpportunity> = None;

        for (i, first) in group.pools.iter().enumerate() {
            for second in &group.pools[i + 1..] {
                for (buy, sell) in [(first, second), (second, first)] {
                    let Some(size) = self.calculator.optimal_size(buy, sell, self.quote_token, budget) else {
                        continue;
                    };

                    if size.profit < *min_profit {
                        debug!(
                            "[{}] {:?} -> {:?}: profit {} below threshold {}",
                            group.name, buy.address, sell.address, size.profit, min_profit
                        );
                        continue;
                    }

                    let better = best
                        .as_ref()
                        .map_or(true, |current| size.profit > current.estimated_profit_quote);
                    if !better {
                        continue;
                    }

                    // optimal_size already checked both pools hold the quote token
                    let Some(base_token) = buy.other_token(self.quote_token) else {
                        continue;
                    };

                    best = Some(ArbitrageOpportunity {
                        buy_pool: buy.clone(),
                        sell_pool: sell.clone(),
                        quote_token: self.quote_token,
                        base_token,
                        amount_quote: size.amount,
                        estimated_profit_quote: size.profit,
                    });
                }
            }
        }

        if let Some(opp) = &best {
            info!(
                "[{}] Opportunity: buy {} ({:?}) -> sell {} ({:?}) | amount {} | profit {}",
                group.name,
                opp.buy_pool.dex,
                opp.buy_pool.address,
                opp.sell_pool.dex,
                opp.sell_pool.address,
                opp.amount_quote,
                opp.estimated_profit_quote
            );
        }

        best
    }
}

/// Run [`OpportunitySelector::select_best`] over every group on the blocking
/// thread pool. Results keep watchlist order; groups with nothing to trade
/// are left out.
pub async fn scan_parallel(
    selector: Arc<OpportunitySelector>,
    groups: Vec<WatchlistGroup>,
    budget: BigUint,
    min_profit: BigUint,
) -> Vec<ArbitrageOpportunity> {
    let budget = Arc::new(budget);
    let min_profit = Arc::new(min_profit);

    let handles = groups.into_iter().map(|group| {
        let selector = Arc::clone(&selector);
        let budget = Arc::clone(&budget);
        let min_profit = Arc::clone(&min_profit);
        tokio::task::spawn_blocking(move || selector.select_best(&group, &budget, &min_profit))
    });

    let mut opportunities = Vec::new();
    for result in join_all(handles).await {
        match result {
            Ok(Some(opp)) => opportunities.push(opp),
            Ok(None) => {}
            Err(e) => warn!("Group scan task failed: {}", e),
        }
    }

    debug!("Watchlist scan found {} opportunities", opportunities.len());
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::SizingConfig;
    use crate::types::{DexType, FeeRatio, PoolState};

    const ETH: u128 = 1_000_000_000_000_000_000;

    fn weth() -> Address {
        Address::repeat_byte(0xEE)
    }

    fn tkn() -> Address {
        Address::repeat_byte(0x11)
    }

    fn pool(tag: u8, dex: DexType, base: u128, quote: u128) -> PoolState {
        PoolState::new(Address::repeat_byte(tag), dex, tkn(), weth(), FeeRatio::UNISWAP_V2)
            .with_reserves(BigUint::from(base), BigUint::from(quote), 100)
    }

    fn selector() -> OpportunitySelector {
        OpportunitySelector::new(OptimalSizeCalculator::new(SizingConfig::default()), weth())
    }

    fn group(pools: Vec<PoolState>) -> WatchlistGroup {
        WatchlistGroup::new(format!("{:?}-{:?}", tkn(), weth()), pools)
    }

    fn unlimited() -> BigUint {
        BigUint::from(10u32).pow(30)
    }

    fn three_pools() -> WatchlistGroup {
        group(vec![
            pool(0xA1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
            pool(0xA2, DexType::Sushiswap, 900_000 * ETH, 1000 * ETH),
            pool(0xA3, DexType::Sushiswap, 950_000 * ETH, 1000 * ETH),
        ])
    }

    #[test]
    fn test_select_best_across_all_pairs() {
        // Candidates: A1->A2 (1.234e18), A1->A3 (2.57e17), A3->A2 (2.89e17)
        let opp = selector()
            .select_best(&three_pools(), &unlimited(), &BigUint::from(0u32))
            .unwrap();

        assert_eq!(opp.buy_pool.address, Address::repeat_byte(0xA1));
        assert_eq!(opp.sell_pool.address, Address::repeat_byte(0xA2));
        assert_eq!(opp.quote_token, weth());
        assert_eq!(opp.base_token, tkn());
        assert_eq!(opp.amount_quote, BigUint::from(24_235_726_767_208_456_260u128));
        assert_eq!(opp.estimated_profit_quote, BigUint::from(1_234_332_246_753_694_716u128));
    }

    #[test]
    fn test_only_one_pair_qualifies() {
        // A3 holds 1.5 WETH, below the 2 WETH floor, so every pair touching it is skipped
        let g = group(vec![
            pool(0xA1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
            pool(0xA3, DexType::Sushiswap, 1500 * ETH, 3 * ETH / 2),
            pool(0xA2, DexType::Sushiswap, 900_000 * ETH, 1000 * ETH),
        ]);
        let selector = selector();
        let calculator = selector.calculator();
        let (a1, a3, a2) = (&g.pools[0], &g.pools[1], &g.pools[2]);
        for (buy, sell) in [(a1, a3), (a3, a1), (a3, a2), (a2, a3), (a2, a1)] {
            assert!(calculator.optimal_size(buy, sell, weth(), &unlimited()).is_none());
        }

        let opp = selector
            .select_best(&g, &unlimited(), &BigUint::from(10u64.pow(16)))
            .unwrap();
        assert_eq!(opp.buy_pool.address, Address::repeat_byte(0xA1));
        assert_eq!(opp.sell_pool.address, Address::repeat_byte(0xA2));
        assert_eq!(opp.amount_quote, BigUint::from(24_235_726_767_208_456_260u128));
        assert_eq!(opp.estimated_profit_quote, BigUint::from(1_234_332_246_753_694_716u128));
    }

    #[test]
    fn test_min_profit_threshold_is_inclusive() {
        let best = BigUint::from(1_234_332_246_753_694_716u128);

        let at_threshold = selector().select_best(&three_pools(), &unlimited(), &best);
        assert!(at_threshold.is_some());

        let above = &best + 1u32;
        assert!(selector().select_best(&three_pools(), &unlimited(), &above).is_none());
    }

    #[test]
    fn test_budget_clamps_every_route() {
        // With 3 WETH every optimum is out of reach; clamped profits are
        // A1->A2 0.2926e18, A3->A2 0.1285e18, A1->A3 0.1199e18
        let budget = BigUint::from(3 * ETH);
        let opp = selector()
            .select_best(&three_pools(), &budget, &BigUint::from(0u32))
            .unwrap();
        assert_eq!(opp.amount_quote, budget);
        assert_eq!(opp.estimated_profit_quote, BigUint::from(292_605_551_622_554_328u128));

        let threshold = BigUint::from(300_000_000_000_000_000u128);
        assert!(selector().select_best(&three_pools(), &budget, &threshold).is_none());
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        // A2 and A4 are identical, so A1->A2 and A1->A4 tie; A1->A2 is visited first
        let g = group(vec![
            pool(0xA1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
            pool(0xA2, DexType::Sushiswap, 900_000 * ETH, 1000 * ETH),
            pool(0xA4, DexType::Sushiswap, 900_000 * ETH, 1000 * ETH),
        ]);
        let opp = selector().select_best(&g, &unlimited(), &BigUint::from(0u32)).unwrap();
        assert_eq!(opp.sell_pool.address, Address::repeat_byte(0xA2));
    }

    #[test]
    fn test_degenerate_groups() {
        let s = selector();
        assert!(s.select_best(&group(vec![]), &unlimited(), &BigUint::from(0u32)).is_none());

        let single = group(vec![pool(0xA1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH)]);
        assert!(s.select_best(&single, &unlimited(), &BigUint::from(0u32)).is_none());

        let balanced = group(vec![
            pool(0xA1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
            pool(0xA2, DexType::Sushiswap, 1_000_000 * ETH, 1000 * ETH),
        ]);
        assert!(s.select_best(&balanced, &unlimited(), &BigUint::from(0u32)).is_none());
    }

    #[test]
    fn test_select_best_is_idempotent() {
        let s = selector();
        let g = three_pools();
        let min = BigUint::from(10u64.pow(16));
        assert_eq!(
            s.select_best(&g, &unlimited(), &min),
            s.select_best(&g, &unlimited(), &min)
        );
    }

    #[tokio::test]
    async fn test_scan_parallel_keeps_group_order() {
        let balanced = group(vec![
            pool(0xB1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
            pool(0xB2, DexType::Sushiswap, 1_000_000 * ETH, 1000 * ETH),
        ]);
        let reversed = group(vec![
            pool(0xC2, DexType::Sushiswap, 900_000 * ETH, 1000 * ETH),
            pool(0xC1, DexType::UniswapV2, 1_000_000 * ETH, 1000 * ETH),
        ]);

        let results = scan_parallel(
            Arc::new(selector()),
            vec![three_pools(), balanced, reversed],
            unlimited(),
            BigUint::from(10u64.pow(16)),
        )
        .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].buy_pool.address, Address::repeat_byte(0xA1));
        assert_eq!(results[1].buy_pool.address, Address::repeat_byte(0xC1));
        assert_eq!(results[1].sell_pool.address, Address::repeat_byte(0xC2));
        assert_eq!(results[1].estimated_profit_quote, results[0].estimated_profit_quote);
    }
}
