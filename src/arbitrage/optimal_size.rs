//! Optimal position sizing for two-pool arbitrage
//!
//! Finds the quote-token input that maximizes profit when buying the base
//! token on one constant-product pool and selling it on another.
//!
//! With `d` quote spent on the buy pool (reserves `Ra` base / `Rb` quote,
//! fee multiplier `y`) and the base sold into the sell pool (`Ra2` / `Rb2`, `y2`):
//!
//! ```text
//! profit(d) = Rb2 - Ra2 * Rb2 / (Ra2 + y2 * (Ra - Ra * Rb / (Rb + y * d))) - d
//! ```
//!
//! `profit` is concave for `d >= 0`; its maximizer is the positive root of
//! `profit'(d) = 0`, a quadratic solved in closed form below. Fee multipliers
//! are integers scaled by a common `M`, and every scaled product is divided
//! back by the matching power of `M` right after the multiplication. That
//! ordering fixes the rounding, so it must not be rearranged.
//!
//! Created: 2026-10-17

use crate::math::{isqrt, lcm, to_signed, to_unsigned, MathError};
use crate::types::PoolState;
use alloy::primitives::Address;
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, Zero};
use tracing::{debug, warn};

/// 2 WETH: quote reserves below this are treated as dust
pub const DEFAULT_MIN_QUOTE_LIQUIDITY: u128 = 2_000_000_000_000_000_000;

/// Configuration for position sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizingConfig {
    /// Minimum quote-token reserve each pool must hold, in quote minor units
    pub min_quote_liquidity: BigUint,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            min_quote_liquidity: BigUint::from(DEFAULT_MIN_QUOTE_LIQUIDITY),
        }
    }
}

/// Profit-maximizing trade size and the profit it yields, both in quote units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimalSize {
    pub amount: BigUint,
    pub profit: BigUint,
}

/// Calculates optimal trade sizes for arbitrage
#[derive(Debug, Clone, Default)]
pub struct OptimalSizeCalculator {
    config: SizingConfig,
}

impl OptimalSizeCalculator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Optimal quote amount to buy on `buy` and sell on `sell`, capped at `budget`.
    ///
    /// `None` means "no opportunity": quote token missing from a pool,
    /// mismatched base tokens, empty or dust liquidity, no positive root,
    /// or a non-positive profit at the best feasible amount.
    pub fn optimal_size(
        &self,
        buy: &PoolState,
        sell: &PoolState,
        quote_token: Address,
        budget: &BigUint,
    ) -> Option<OptimalSize> {
        let curve = self.curve(buy, sell, quote_token)?;

        let mut best: Option<(BigInt, BigInt)> = None;
        for negative_sqrt in [false, true] {
            let root = match curve.root(negative_sqrt) {
                Ok(root) => root,
                Err(e) => {
                    warn!("Sizing {:?} -> {:?} aborted: {}", buy.address, sell.address, e);
                    return None;
                }
            };
            if !root.is_positive() {
                continue;
            }

            let profit = curve.profit(&root);
            if !profit.is_positive() {
                continue;
            }

            // Strictly larger profit wins; the positive-radical root keeps ties
            let better = best.as_ref().map_or(true, |(_, best_profit)| profit > *best_profit);
            if better {
                best = Some((root, profit));
            }
        }

        let (amount, profit) = best?;
        let budget = to_signed(budget);

        let (amount, profit) = if amount > budget {
            let clamped = curve.profit(&budget);
            debug!(
                "Optimal size {} exceeds budget {} for {:?} -> {:?}; clamped profit {}",
                amount, budget, buy.address, sell.address, clamped
            );
            (budget, clamped)
        } else {
            (amount, profit)
        };

        if !profit.is_positive() {
            return None;
        }

        Some(OptimalSize {
            amount: to_unsigned(&amount)?,
            profit: to_unsigned(&profit)?,
        })
    }

    /// Profit function evaluated at `amount`, with the same preconditions as
    /// [`optimal_size`](Self::optimal_size). May be negative.
    pub fn profit_at(
        &self,
        buy: &PoolState,
        sell: &PoolState,
        quote_token: Address,
        amount: &BigUint,
    ) -> Option<BigInt> {
        let curve = self.curve(buy, sell, quote_token)?;
        Some(curve.profit(&to_signed(amount)))
    }

    /// Validate both pools and orient their reserves around the quote token
    fn curve(&self, buy: &PoolState, sell: &PoolState, quote_token: Address) -> Option<ProfitCurve> {
        let Some((base1, quote1)) = buy.reserves_for_quote(quote_token) else {
            debug!("Pool {:?} does not hold quote token {:?}", buy.address, quote_token);
            return None;
        };
        let Some((base2, quote2)) = sell.reserves_for_quote(quote_token) else {
            debug!("Pool {:?} does not hold quote token {:?}", sell.address, quote_token);
            return None;
        };

        if buy.other_token(quote_token) != sell.other_token(quote_token) {
            debug!(
                "Base token mismatch between {:?} and {:?}",
                buy.address, sell.address
            );
            return None;
        }

        if !buy.has_liquidity() || !sell.has_liquidity() {
            return None; // no liquidity
        }

        let floor = &self.config.min_quote_liquidity;
        if quote1 < floor || quote2 < floor {
            debug!(
                "Skipping {:?} -> {:?}: quote reserves ({}, {}) below floor {}",
                buy.address, sell.address, quote1, quote2, floor
            );
            return None;
        }

        Some(ProfitCurve::new(
            base1, quote1, buy.fee.retained(), buy.fee.denominator(),
            base2, quote2, sell.fee.retained(), sell.fee.denominator(),
        ))
    }
}

/// Oriented reserves and scaled fee multipliers for one buy/sell pool pair
struct ProfitCurve {
    r_a: BigInt,
    r_b: BigInt,
    r_a2: BigInt,
    r_b2: BigInt,
    y: BigInt,
    y2: BigInt,
    m: BigInt,
    m2: BigInt,
    m3: BigInt,
}

impl ProfitCurve {
    #[allow(clippy::too_many_arguments)]
    fn new(
        base1: &BigUint,
        quote1: &BigUint,
        retained1: u64,
        denominator1: u64,
        base2: &BigUint,
        quote2: &BigUint,
        retained2: u64,
        denominator2: u64,
    ) -> Self {
        // Common fee multiplier: 10^max(decimals) when both fees are decimal fractions
        let m = lcm(denominator1, denominator2);
        let y = BigInt::from(retained1) * (&m / denominator1);
        let y2 = BigInt::from(retained2) * (&m / denominator2);

        Self {
            r_a: to_signed(base1),
            r_b: to_signed(quote1),
            r_a2: to_signed(base2),
            r_b2: to_signed(quote2),
            y,
            y2,
            m2: &m * &m,
            m3: &m * &m * &m,
            m,
        }
    }

    /// One root of the profit derivative (`negative_sqrt` picks the sign of the radical)
    ///
    /// ```text
    ///        ±sqrt(Ra³·Rb·Ra2·Rb2·y³·y2³ + 2·Ra²·Rb·Ra2²·Rb2·y³·y2² + Ra·Rb·Ra2³·Rb2·y³·y2) - Ra·Rb·Ra2·y·y2 - Rb·Ra2²·y
    /// d  =  ----------------------------------------------------------------------------------------------------------
    ///                                   Ra²·y²·y2² + 2·Ra·Ra2·y²·y2 + Ra2²·y²
    /// ```
    fn root(&self, negative_sqrt: bool) -> Result<BigInt, MathError> {
        let (r_a, r_b, r_a2, r_b2) = (&self.r_a, &self.r_b, &self.r_a2, &self.r_b2);
        let (y, y2, m, m2, m3) = (&self.y, &self.y2, &self.m, &self.m2, &self.m3);

        // Ra³·Rb·Ra2·Rb2·y³·y2³
        let mut term1 = r_a.pow(3) * r_b * r_a2 * r_b2;
        term1 = y.pow(3) * term1 / m3;
        term1 = y2.pow(3) * term1 / m3;

        // 2·Ra²·Rb·Ra2²·Rb2·y³·y2²
        let mut term2 = r_a.pow(2) * 2u32 * r_b;
        term2 = r_a2.pow(2) * term2 * r_b2;
        term2 = y.pow(3) * term2 / m3;
        term2 = y2.pow(2) * term2 / m2;

        // Ra·Rb·Ra2³·Rb2·y³·y2
        let mut term3 = r_a2.pow(3) * r_a * r_b * r_b2 * y2 / m;
        term3 = y.pow(3) * term3 / m3;

        let mut numerator = isqrt(&(term1 + term2 + term3))?;
        if negative_sqrt {
            numerator = -numerator;
        }

        // Ra·Rb·Ra2·y·y2
        let term4 = r_a * r_b * r_a2 * y * y2 / m2;
        // Rb·Ra2²·y
        let term5 = r_a2.pow(2) * r_b * y / m;
        numerator = numerator - term4 - term5;

        // Ra²·y²·y2²
        let mut term6 = r_a.pow(2);
        term6 = y.pow(2) * term6 / m2;
        term6 = y2.pow(2) * term6 / m2;

        // 2·Ra·Ra2·y²·y2
        let mut term7 = r_a * 2u32 * r_a2 * y2;
        term7 = y.pow(2) * term7 / m3;

        // Ra2²·y²
        let mut term8 = y.pow(2);
        term8 = r_a2.pow(2) * term8 / m2;

        let denominator = term8 + term7 + term6;
        if denominator.is_zero() {
            return Ok(BigInt::zero());
        }

        Ok(numerator / denominator)
    }

    /// Net profit in quote units for spending `d_b` quote on the buy pool
    fn profit(&self, d_b: &BigInt) -> BigInt {
        let (r_a, r_b, r_a2, r_b2) = (&self.r_a, &self.r_b, &self.r_a2, &self.r_b2);

        let mut res = &self.y * d_b / &self.m + r_b; // Rb + y·d
        res = r_a * r_b / res; // Ra·Rb / (Rb + y·d)
        res = r_a - res; // base bought
        res = res * &self.y2 / &self.m; // y2 · base bought
        res = r_a2 + res; // Ra2 + y2 · base bought
        res = r_a2 * r_b2 / res; // Ra2·Rb2 / (...)
        r_b2 - res - d_b
    }
}
