//! Fixed-point decimal conversions.
//!
//! Every balance, rate and derived value in the crate is a `BigDecimal`.
//! Raw on-chain integers are converted with their token's decimal places:
//! `decimal_value = raw_integer / 10^decimals`. Addition, subtraction and
//! multiplication on `BigDecimal` are exact; division rounds to the crate's
//! default precision (100 significant digits), which is why callers compare
//! quotients with a tolerance rather than exact equality.

use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

// ============================================
// Raw Integer <-> Decimal
// ============================================

/// Convert a raw on-chain integer into its decimal value.
///
/// The conversion is exact: the integer becomes the digits and `decimals`
/// becomes the scale, so no rounding ever happens here.
///
/// # Example
/// ```ignore
/// let one = from_raw(U256::from(1_000_000_000u64), 9); // 1.000000000
/// ```
pub fn from_raw(value: U256, decimals: u8) -> BigDecimal {
    let bytes: [u8; 32] = value.to_le_bytes();
    let big_int = BigInt::from_bytes_le(Sign::Plus, &bytes);
    BigDecimal::new(big_int, decimals as i64)
}

/// Convert a decimal value back to the raw integer representation.
///
/// Digits beyond `decimals` places are truncated. Negative values and
/// values that do not fit in 256 bits are rejected.
pub fn to_raw(value: &BigDecimal, decimals: u8) -> Result<U256> {
    let unrepresentable = || Error::Unrepresentable {
        value: value.to_string(),
        decimals,
    };

    let scaled = value * big_pow10(decimals);
    let (digits, _) = scaled.with_scale(0).into_bigint_and_exponent();
    if digits.sign() == Sign::Minus {
        return Err(unrepresentable());
    }

    let (_, bytes) = digits.to_bytes_le();
    if bytes.len() > 32 {
        return Err(unrepresentable());
    }

    Ok(U256::from_le_slice(&bytes))
}

// ============================================
// Checked Arithmetic
// ============================================

/// Divide two decimals, failing on an exact-zero divisor.
///
/// Pool handlers check their reserves before dividing and map empty pools
/// to "no price"; reaching this error means a caller skipped that check.
pub fn checked_div(numerator: &BigDecimal, denominator: &BigDecimal) -> Result<BigDecimal> {
    if denominator.is_zero() {
        return Err(Error::DivisionByZero);
    }

    Ok(numerator / denominator)
}

/// Raise a decimal to a non-negative integer power by repeated squaring.
///
/// Intermediate products are rounded to `precision` significant digits to
/// keep large exponents tractable.
pub fn pow_rounded(base: &BigDecimal, exponent: u32, precision: u64) -> BigDecimal {
    let mut result = BigDecimal::from(1);
    let mut square = base.clone();
    let mut remaining = exponent;

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = (&result * &square).with_prec(precision);
        }
        square = (&square * &square).with_prec(precision);
        remaining >>= 1;
    }

    result
}

// ============================================
// Internal Helpers
// ============================================

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

/// Compute 10^exp as BigDecimal.
pub(crate) fn big_pow10(exp: u8) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp as u32))
    }
}
