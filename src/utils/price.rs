//! Price conversion utilities for Uniswap V3.
//!
//! Converts the pool's `sqrtPriceX96` slot value to a decimal-adjusted
//! exchange rate.

use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use num_traits::Zero;
use once_cell::sync::Lazy;

use super::conversion::{big_pow10, from_raw};

// ============================================
// Constants
// ============================================

/// 2^192, the scale of `sqrtPriceX96` squared.
static Q192: Lazy<BigDecimal> = Lazy::new(|| from_raw(U256::from(1u8) << 192, 0));

// ============================================
// sqrtPriceX96 to Price Conversion
// ============================================

/// Convert sqrtPriceX96 to the decimal-adjusted price of token0 in token1.
///
/// raw_price = sqrtPriceX96^2 / 2^192 is token1 raw units per token0 raw
/// unit; multiplying by 10^(decimals0 - decimals1) expresses it in whole
/// tokens.
///
/// # Returns
/// * `Some(price)` (token1 per token0), or `None` for an uninitialised pool
pub fn sqrt_price_x96_to_price(
    sqrt_price_x96: U256,
    token0_decimals: u8,
    token1_decimals: u8,
) -> Option<BigDecimal> {
    let sqrt_price = from_raw(sqrt_price_x96, 0);
    if sqrt_price.is_zero() {
        return None;
    }

    let raw_price = (&sqrt_price * &sqrt_price) / &*Q192;

    let adjusted = if token0_decimals >= token1_decimals {
        raw_price * big_pow10(token0_decimals - token1_decimals)
    } else {
        raw_price / big_pow10(token1_decimals - token0_decimals)
    };

    Some(adjusted)
}
