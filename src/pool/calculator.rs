//! Price Calculator
//!
//! Exact constant-product (x * y = k) swap math on unbounded integers,
//! with the pool fee applied to the input as an exact ratio.
//!
//! Created: 2026-10-17

use crate::types::{FeeRatio, PoolState};
use alloy::primitives::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::debug;

/// Stateless swap math for constant-product pools
pub struct PriceCalculator;

impl PriceCalculator {
    /// Calculate amount out for a given input using constant product formula
    ///
    /// Formula: amount_out = (amount_in * (den - num) * reserve_out) / (reserve_in * den + amount_in * (den - num))
    /// With the 0.30% fee this is the familiar 997/1000 form.
    pub fn get_amount_out(
        amount_in: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: FeeRatio,
    ) -> BigUint {
        if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
            return BigUint::zero();
        }

        let amount_in_with_fee = amount_in * fee.retained();
        let numerator = &amount_in_with_fee * reserve_out;
        let denominator = reserve_in * fee.denominator() + &amount_in_with_fee;

        numerator / denominator
    }

    /// Calculate amount in required to get a specific output
    /// Inverse of get_amount_out, rounded up. `None` when the pool cannot pay `amount_out`.
    ///
    /// Formula: amount_in = (reserve_in * amount_out * den) / ((reserve_out - amount_out) * (den - num)) + 1
    pub fn get_amount_in(
        amount_out: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: FeeRatio,
    ) -> Option<BigUint> {
        if amount_out.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
            return Some(BigUint::zero());
        }

        if amount_out >= reserve_out {
            return None; // Not enough liquidity
        }

        let numerator = reserve_in * amount_out * fee.denominator();
        let denominator = (reserve_out - amount_out) * fee.retained();

        Some(numerator / denominator + 1u32)
    }

    /// Simulate a complete arbitrage round trip with on-chain rounding.
    /// Returns (base_received_on_buy, quote_received_on_sell), or `None`
    /// if `quote` is missing from either pool.
    pub fn simulate_arbitrage(
        buy_pool: &PoolState,
        sell_pool: &PoolState,
        quote: Address,
        amount_in: &BigUint,
    ) -> Option<(BigUint, BigUint)> {
        // Step 1: quote -> base on the cheaper pool
        let base = buy_pool.other_token(quote)?;
        let amount_mid = buy_pool.amount_out(quote, amount_in)?;

        // Step 2: base -> quote on the dearer pool
        let amount_out = sell_pool.amount_out(base, &amount_mid)?;

        debug!(
            "Arbitrage simulation: in={}, mid={}, out={}",
            amount_in, amount_mid, amount_out
        );

        Some((amount_mid, amount_out))
    }
}
