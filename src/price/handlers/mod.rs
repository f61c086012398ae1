//! One [`PriceHandler`](super::PriceHandler) per pool topology.
//!
//! - [`uniswap_v2`] - Constant-product pairs (Uniswap V2 and FraxSwap)
//! - [`uniswap_v3`] - Concentrated-liquidity pools priced from `slot0`
//! - [`balancer`] - Balancer weighted pools
//! - [`curve`] - Two-token Curve pools
//! - [`stablecoin`] - Fixed $1 peg
//! - [`custom_mapping`] - Derivative tokens priced as their underlying

use std::sync::Arc;

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use bigdecimal::BigDecimal;
use num_traits::Zero;

use super::PriceLookup;
use crate::{
    abis::IERC20,
    chain::{self, Block, ContractReader},
    config::TokenCatalog,
    error::{Error, Result},
    utils::from_raw,
};

pub mod balancer;
pub mod curve;
pub mod custom_mapping;
pub mod stablecoin;
pub mod uniswap_v2;
pub mod uniswap_v3;

pub use balancer::BalancerWeightedHandler;
pub use curve::CurveHandler;
pub use custom_mapping::CustomMappingHandler;
pub use stablecoin::StablecoinHandler;
pub use uniswap_v2::UniswapV2Handler;
pub use uniswap_v3::UniswapV3Handler;

/// Decimal places of every pool share token we value.
pub const SHARE_DECIMALS: u8 = 18;

/// Chain access shared by the pool handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub reader: Arc<dyn ContractReader>,
    pub tokens: Arc<TokenCatalog>,
}

impl HandlerContext {
    pub fn new(reader: Arc<dyn ContractReader>, tokens: Arc<TokenCatalog>) -> Self {
        Self { reader, tokens }
    }

    pub fn read<C: SolCall>(&self, to: Address, call: &C, block: &Block) -> Result<Option<C::Return>> {
        chain::read(self.reader.as_ref(), to, call, block)
    }

    pub fn decimals(&self, token: Address) -> Result<u8> {
        self.tokens.decimals(token)
    }

    /// Convert a raw amount of `token` to its decimal value.
    pub fn amount(&self, token: Address, raw: U256) -> Result<BigDecimal> {
        Ok(from_raw(raw, self.decimals(token)?))
    }

    /// ERC-20 balance of `holder`, zero when the read reverts.
    pub fn erc20_balance(&self, token: Address, holder: Address, block: &Block) -> Result<BigDecimal> {
        let raw = self
            .read(token, &IERC20::balanceOfCall { account: holder }, block)?
            .unwrap_or_default();
        self.amount(token, raw)
    }

    /// Total supply of a pool share token.
    pub fn share_supply(&self, share_token: Address, block: &Block) -> Result<Option<BigDecimal>> {
        Ok(self
            .read(share_token, &IERC20::totalSupplyCall {}, block)?
            .map(|raw| from_raw(raw, SHARE_DECIMALS)))
    }

    /// Pool shares held by `wallet`.
    pub fn share_balance(
        &self,
        share_token: Address,
        wallet: Address,
        block: &Block,
    ) -> Result<Option<BigDecimal>> {
        Ok(self
            .read(share_token, &IERC20::balanceOfCall { account: wallet }, block)?
            .map(|raw| from_raw(raw, SHARE_DECIMALS)))
    }
}

/// Id used for a pool identified by its contract address.
pub fn pool_id(pool: &Address) -> String {
    format!("{pool:#x}")
}

/// Position of `token` among the pool's on-chain tokens.
///
/// A configured member missing on-chain means the static configuration is
/// stale, which is fatal.
pub(crate) fn position(pool: &str, tokens: &[Address], token: Address) -> Result<usize> {
    tokens
        .iter()
        .position(|candidate| *candidate == token)
        .ok_or_else(|| Error::TokenNotInPool {
            pool: pool.to_string(),
            token,
        })
}

/// Sum `balance * price` over pool holdings, skipping `excluded` tokens.
///
/// Prices are looked up without a current pool: valuing a pool is not part
/// of quoting one of its tokens, so the pool itself may supply a price.
/// Returns `None` as soon as one required price is unavailable.
pub(crate) fn holdings_value(
    holdings: &[(Address, BigDecimal)],
    excluded: &[Address],
    lookup: &dyn PriceLookup,
    block: &Block,
) -> Result<Option<BigDecimal>> {
    let mut total = BigDecimal::zero();

    for (token, balance) in holdings {
        if excluded.contains(token) || balance.is_zero() {
            continue;
        }

        let Some(quote) = lookup.lookup(*token, block, None)? else {
            return Ok(None);
        };
        total += balance * &quote.price;
    }

    Ok(Some(total))
}
