//! Exact Integer Math
//!
//! Arbitrary-precision helpers shared by the sizing engine.
//! Reserve products in the optimal-size derivation reach the sixth power
//! of a uint112 reserve, so everything here works on unbounded integers.
//!
//! Created: 2026-10-17

use alloy::primitives::U256;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed};
use thiserror::Error;

/// Errors raised by the integer math helpers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Square root requested for a negative value (caller precondition violated)
    #[error("square root of negative value: {0}")]
    NegativeSquareRoot(BigInt),
}

/// Floor square root of a non-negative big integer.
///
/// Returns the unique `r >= 0` with `r * r <= n < (r + 1) * (r + 1)`.
///
/// Newton's method seeded at `2^ceil(bits / 2)`, which is never below the
/// true root, so the iteration decreases monotonically until it stalls.
pub fn isqrt(n: &BigInt) -> Result<BigInt, MathError> {
    if n.is_negative() {
        return Err(MathError::NegativeSquareRoot(n.clone()));
    }
    if *n < BigInt::from(2) {
        return Ok(n.clone());
    }

    let mut x = BigInt::one() << ((n.bits() + 1) / 2);
    loop {
        let next = (&x + n / &x) >> 1usize;
        if next >= x {
            break;
        }
        x = next;
    }

    // Floor correction
    while &x * &x > *n {
        x -= 1u32;
    }

    Ok(x)
}

/// Least common multiple of two non-zero fee denominators.
///
/// Two coprime `u64` denominators overflow `u64`, so the result is unbounded.
pub fn lcm(a: u64, b: u64) -> BigInt {
    let (mut x, mut y) = (a, b);
    while y != 0 {
        let r = x % y;
        x = y;
        y = r;
    }
    BigInt::from(a / x) * BigInt::from(b)
}

/// Convert an on-chain uint256 into an unbounded integer
pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Convert an unbounded integer back to uint256, `None` when it does not fit
pub fn biguint_to_u256(value: &BigUint) -> Option<U256> {
    U256::try_from_be_slice(&value.to_bytes_be())
}

/// Signed view of an unsigned amount
pub fn to_signed(value: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, value.clone())
}

/// Unsigned view of a signed amount, `None` for negative values
pub fn to_unsigned(value: &BigInt) -> Option<BigUint> {
    value.to_biguint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use proptest::prelude::*;

    fn sqrt_of(n: u128) -> BigInt {
        isqrt(&BigInt::from(n)).unwrap()
    }

    #[test]
    fn test_isqrt_examples() {
        assert_eq!(sqrt_of(1_000_000), BigInt::from(1000));
        assert_eq!(sqrt_of(1_000_001), BigInt::from(1000));
        assert_eq!(sqrt_of(0), BigInt::from(0));
        assert_eq!(sqrt_of(1), BigInt::from(1));
        assert_eq!(sqrt_of(2), BigInt::from(1));
        assert_eq!(sqrt_of(3), BigInt::from(1));
        assert_eq!(sqrt_of(4), BigInt::from(2));
        assert_eq!(sqrt_of(1_002_000), BigInt::from(1000));
        assert_eq!(sqrt_of(1_002_001), BigInt::from(1001));
    }

    #[test]
    fn test_isqrt_negative_is_domain_error() {
        let err = isqrt(&BigInt::from(-4)).unwrap_err();
        assert_eq!(err, MathError::NegativeSquareRoot(BigInt::from(-4)));
    }

    #[test]
    fn test_isqrt_beyond_256_bits() {
        // (2^256 - 1)^2 needs 512 bits
        let max = (BigInt::one() << 256usize) - 1u32;
        let square = &max * &max;
        assert_eq!(isqrt(&square).unwrap(), max);
        assert_eq!(isqrt(&(&square - 1u32)).unwrap(), &max - 1u32);
        assert_eq!(isqrt(&(&square + 1u32)).unwrap(), max);
    }

    #[test]
    fn test_lcm() {
        assert_eq!(lcm(1000, 1000), BigInt::from(1000));
        assert_eq!(lcm(1000, 10_000), BigInt::from(10_000));
        assert_eq!(lcm(4, 6), BigInt::from(12));
    }

    #[test]
    fn test_lcm_of_coprime_denominators_exceeds_u64() {
        let (a, b) = (4_294_967_311u64, 4_294_967_357u64);
        let expected = BigInt::from(a) * BigInt::from(b);
        assert!(expected > BigInt::from(u64::MAX));
        assert_eq!(lcm(a, b), expected);
        assert_eq!(lcm(u64::MAX, u64::MAX), BigInt::from(u64::MAX));
    }

    #[test]
    fn test_u256_roundtrip_boundaries() {
        assert_eq!(u256_to_biguint(U256::ZERO), BigUint::zero());
        assert_eq!(u256_to_biguint(U256::MAX), (BigUint::one() << 256usize) - 1u32);

        let too_big = BigUint::one() << 256usize;
        assert!(biguint_to_u256(&too_big).is_none());
        assert_eq!(biguint_to_u256(&BigUint::from(42u32)), Some(U256::from(42u64)));
    }

    proptest! {
        #[test]
        fn prop_isqrt_floor_contract(n in any::<u128>()) {
            let n = BigInt::from(n);
            let r = isqrt(&n).unwrap();
            prop_assert!(&r * &r <= n);
            let next = &r + 1u32;
            prop_assert!(&next * &next > n);
        }

        #[test]
        fn prop_isqrt_wide_inputs(hi in any::<u128>(), lo in any::<u128>(), shift in 0usize..300) {
            let n = ((BigInt::from(hi) << 128usize) + BigInt::from(lo)) << shift;
            let r = isqrt(&n).unwrap();
            prop_assert!(&r * &r <= n);
            let next = &r + 1u32;
            prop_assert!(&next * &next > n);
        }
    }
}
