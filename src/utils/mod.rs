//! Utility functions for the treasury indexer.
//!
//! This module is organized into focused submodules:
//!
//! - [`conversion`] - Exact raw integer <-> decimal conversion and checked arithmetic
//! - [`price`] - Uniswap V3 sqrtPriceX96 conversion
//! - [`date`] - Date keys for daily records

mod conversion;
mod date;
mod price;

// ============================================
// Re-exports
// ============================================

pub use conversion::{checked_div, from_raw, pow_rounded, to_raw};
pub use date::date_key;
pub use price::sqrt_price_x96_to_price;
