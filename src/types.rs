// Core data structures shared by the engine and its collaborators

use crate::pool::PriceCalculator;
use alloy::primitives::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Market families we know how to query (all Uniswap V2 style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DexType {
    UniswapV2,
    Sushiswap,
}

impl DexType {
    /// Swap fee charged by this market family
    pub fn default_fee(&self) -> FeeRatio {
        match self {
            DexType::UniswapV2 | DexType::Sushiswap => FeeRatio::UNISWAP_V2,
        }
    }
}

impl fmt::Display for DexType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DexType::UniswapV2 => write!(f, "UniswapV2"),
            DexType::Sushiswap => write!(f, "Sushiswap"),
        }
    }
}

impl FromStr for DexType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniswap" | "uniswapv2" | "uniswap_v2" => Ok(DexType::UniswapV2),
            "sushiswap" | "sushi" => Ok(DexType::Sushiswap),
            other => anyhow::bail!("Unknown dex '{}'. Supported: UniswapV2, Sushiswap", other),
        }
    }
}

/// Invalid fee ratio
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("fee denominator must be non-zero")]
    ZeroDenominator,
    #[error("fee {numerator}/{denominator} must be below 100%")]
    NotBelowOne { numerator: u64, denominator: u64 },
}

/// Proportional swap fee as an exact ratio (3/1000 = 0.30%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeRatio {
    numerator: u64,
    denominator: u64,
}

impl FeeRatio {
    /// Uniswap V2 and its forks: 0.30%
    pub const UNISWAP_V2: FeeRatio = FeeRatio {
        numerator: 3,
        denominator: 1000,
    };

    pub fn new(numerator: u64, denominator: u64) -> Result<Self, FeeError> {
        if denominator == 0 {
            return Err(FeeError::ZeroDenominator);
        }
        if numerator >= denominator {
            return Err(FeeError::NotBelowOne {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Share of the input that reaches the curve, over `denominator` (997 for 0.30%)
    pub fn retained(&self) -> u64 {
        self.denominator - self.numerator
    }
}

impl Default for FeeRatio {
    fn default() -> Self {
        Self::UNISWAP_V2
    }
}

impl fmt::Display for FeeRatio {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.2}%",
            self.numerator as f64 * 100.0 / self.denominator as f64
        )
    }
}

/// A pair factory; every pool it creates charges the same fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Market {
    pub dex: DexType,
    pub factory: Address,
    pub fee: FeeRatio,
}

/// Snapshot of one constant-product pool at a given block.
///
/// Reserves are only ever replaced as a pair (see [`PoolState::with_reserves`]),
/// so both always refer to the same block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub address: Address,
    pub dex: DexType,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: BigUint,
    pub reserve1: BigUint,
    pub fee: FeeRatio,
    pub last_updated: u64, // block number
}

impl PoolState {
    /// Pool with unknown (zero) reserves, as produced by discovery
    pub fn new(address: Address, dex: DexType, token0: Address, token1: Address, fee: FeeRatio) -> Self {
        Self {
            address,
            dex,
            token0,
            token1,
            reserve0: BigUint::zero(),
            reserve1: BigUint::zero(),
            fee,
            last_updated: 0,
        }
    }

    /// Fresh snapshot carrying both reserves from the same block
    pub fn with_reserves(&self, reserve0: BigUint, reserve1: BigUint, block: u64) -> Self {
        Self {
            reserve0,
            reserve1,
            last_updated: block,
            ..self.clone()
        }
    }

    pub fn contains_token(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// The token on the other side of `token`, if `token` is in this pool
    pub fn other_token(&self, token: Address) -> Option<Address> {
        if token == self.token0 {
            Some(self.token1)
        } else if token == self.token1 {
            Some(self.token0)
        } else {
            None
        }
    }

    /// Reserves oriented as (base, quote) for the given quote token
    pub fn reserves_for_quote(&self, quote: Address) -> Option<(&BigUint, &BigUint)> {
        if quote == self.token1 {
            Some((&self.reserve0, &self.reserve1))
        } else if quote == self.token0 {
            Some((&self.reserve1, &self.reserve0))
        } else {
            None
        }
    }

    pub fn has_liquidity(&self) -> bool {
        !self.reserve0.is_zero() && !self.reserve1.is_zero()
    }

    /// Unordered pair key: (lower address, higher address)
    pub fn pair_key(&self) -> (Address, Address) {
        if self.token0 <= self.token1 {
            (self.token0, self.token1)
        } else {
            (self.token1, self.token0)
        }
    }

    /// Output of swapping `amount_in` of `token_in` on this pool
    pub fn amount_out(&self, token_in: Address, amount_in: &BigUint) -> Option<BigUint> {
        let (reserve_out, reserve_in) = self.reserves_for_quote(token_in)?;
        Some(PriceCalculator::get_amount_out(
            amount_in,
            reserve_in,
            reserve_out,
            self.fee,
        ))
    }
}

/// Pools known to trade the same unordered token pair
#[derive(Debug, Clone)]
pub struct WatchlistGroup {
    /// Canonical pair key: "<lower token>-<higher token>"
    pub name: String,
    pub pools: Vec<PoolState>,
}

impl WatchlistGroup {
    pub fn new(name: String, pools: Vec<PoolState>) -> Self {
        Self { name, pools }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Arbitrage opportunity: buy base on `buy_pool` with quote, sell it on `sell_pool`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrageOpportunity {
    pub buy_pool: PoolState,
    pub sell_pool: PoolState,
    pub quote_token: Address,
    pub base_token: Address,
    /// Size of the initial trade, in quote-token minor units
    pub amount_quote: BigUint,
    /// Net profit after both swaps and fees, in quote-token minor units
    pub estimated_profit_quote: BigUint,
}

impl ArbitrageOpportunity {
    pub fn is_profitable(&self, min_profit: &BigUint) -> bool {
        self.estimated_profit_quote >= *min_profit
    }

    /// Base tokens received from the buy leg (input of the sell leg)
    pub fn expected_base_amount(&self) -> BigUint {
        self.buy_pool
            .amount_out(self.quote_token, &self.amount_quote)
            .unwrap_or_default()
    }

    /// Quote tokens returned by the sell leg
    pub fn expected_quote_out(&self) -> BigUint {
        self.sell_pool
            .amount_out(self.base_token, &self.expected_base_amount())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn pool(reserve0: u64, reserve1: u64) -> PoolState {
        PoolState::new(addr(0xAA), DexType::UniswapV2, addr(1), addr(2), FeeRatio::UNISWAP_V2)
            .with_reserves(BigUint::from(reserve0), BigUint::from(reserve1), 7)
    }

    #[test]
    fn test_fee_ratio_validation() {
        assert_eq!(FeeRatio::new(3, 0), Err(FeeError::ZeroDenominator));
        assert!(FeeRatio::new(1000, 1000).is_err());
        let fee = FeeRatio::new(25, 10_000).unwrap();
        assert_eq!(fee.retained(), 9975);
        assert_eq!(FeeRatio::UNISWAP_V2.retained(), 997);
        assert_eq!(FeeRatio::UNISWAP_V2.to_string(), "0.30%");
    }

    #[test]
    fn test_with_reserves_leaves_original_untouched() {
        let original = pool(10, 20);
        let updated = original.with_reserves(BigUint::from(11u32), BigUint::from(21u32), 8);
        assert_eq!(original.reserve0, BigUint::from(10u32));
        assert_eq!(original.last_updated, 7);
        assert_eq!(updated.reserve0, BigUint::from(11u32));
        assert_eq!(updated.reserve1, BigUint::from(21u32));
        assert_eq!(updated.last_updated, 8);
        assert_eq!(updated.address, original.address);
    }

    #[test]
    fn test_reserves_for_quote_orientation() {
        let p = pool(10, 20);
        let (base, quote) = p.reserves_for_quote(addr(2)).unwrap();
        assert_eq!((base, quote), (&BigUint::from(10u32), &BigUint::from(20u32)));
        let (base, quote) = p.reserves_for_quote(addr(1)).unwrap();
        assert_eq!((base, quote), (&BigUint::from(20u32), &BigUint::from(10u32)));
        assert!(p.reserves_for_quote(addr(3)).is_none());
        assert_eq!(p.other_token(addr(1)), Some(addr(2)));
        assert_eq!(p.other_token(addr(3)), None);
    }

    #[test]
    fn test_amount_out_matches_constant_product() {
        // 100 in against 1000/1000 reserves at 0.30% -> 90
        let p = pool(1000, 1000);
        assert_eq!(p.amount_out(addr(1), &BigUint::from(100u32)), Some(BigUint::from(90u32)));
        assert_eq!(p.amount_out(addr(3), &BigUint::from(100u32)), None);
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let a = pool(1, 1);
        let mut b = a.clone();
        std::mem::swap(&mut b.token0, &mut b.token1);
        assert_eq!(a.pair_key(), b.pair_key());
    }

    #[test]
    fn test_dex_type_parse() {
        assert_eq!("UniswapV2".parse::<DexType>().unwrap(), DexType::UniswapV2);
        assert_eq!("sushi".parse::<DexType>().unwrap(), DexType::Sushiswap);
        assert!("curve".parse::<DexType>().is_err());
    }
}
