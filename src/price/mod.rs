//! USD price resolution.
//!
//! A token's price is resolved by asking every [`PriceHandler`] that holds
//! it for a quote and keeping the quote backed by the most liquidity (see
//! [`router`]). Handlers quote a token against a peer token in the same
//! pool, and price that peer by calling back into the resolver through a
//! [`PriceLookup`], so lookups recurse through the pool graph until they
//! reach a fixed-price anchor such as a stablecoin (see [`resolver`]).

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::{chain::Block, error::Result, utils::checked_div};

pub mod handlers;
pub mod resolver;
pub mod router;

pub use handlers::{
    BalancerWeightedHandler, CurveHandler, CustomMappingHandler, HandlerContext, StablecoinHandler,
    UniswapV2Handler, UniswapV3Handler,
};
pub use resolver::{MissingPricePolicy, PriceResolver, DEFAULT_MAX_DEPTH};
pub use router::best_price;

/// One handler's candidate quote for a token.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLookupResult {
    /// USD price of one whole token
    pub price: BigDecimal,
    /// USD depth backing the quote, used to pick between candidates
    pub liquidity: BigDecimal,
}

impl PriceLookupResult {
    pub fn new(price: BigDecimal, liquidity: BigDecimal) -> Self {
        Self { price, liquidity }
    }
}

/// Callback used by handlers to price peer tokens.
///
/// `current_pool` is the id of the pool asking for the price, so that pool
/// is not consulted again for the peer's price.
pub trait PriceLookup {
    fn lookup(
        &self,
        token: Address,
        block: &Block,
        current_pool: Option<&str>,
    ) -> Result<Option<PriceLookupResult>>;
}

/// Rate calculation for one pool topology.
///
/// Membership is fixed at construction; every method is a pure function of
/// its arguments and the chain state at `block`. `None` means "no data"
/// (reverted read, empty pool, unpriceable peer) and is not an error.
pub trait PriceHandler {
    /// Id of the pool behind this handler, passed as `current_pool` when it
    /// asks for peer prices.
    fn id(&self) -> &str;

    fn matches(&self, token: Address) -> bool;

    /// Quote `token` in USD.
    ///
    /// Fails when `token` is configured for this handler but the pool does
    /// not actually hold it.
    fn price(
        &self,
        token: Address,
        lookup: &dyn PriceLookup,
        block: &Block,
    ) -> Result<Option<PriceLookupResult>>;

    /// USD value of everything in the pool, skipping `excluded` tokens.
    fn total_value(
        &self,
        _excluded: &[Address],
        _lookup: &dyn PriceLookup,
        _block: &Block,
    ) -> Result<Option<BigDecimal>> {
        Ok(None)
    }

    /// USD value of one pool share.
    fn unit_price(&self, lookup: &dyn PriceLookup, block: &Block) -> Result<Option<BigDecimal>> {
        let Some(total_value) = self.total_value(&[], lookup, block)? else {
            return Ok(None);
        };
        let Some(supply) = self.share_supply(block)? else {
            return Ok(None);
        };
        if supply.is_zero() {
            return Ok(None);
        }

        checked_div(&total_value, &supply).map(Some)
    }

    /// Total supply of the pool's share token.
    fn share_supply(&self, _block: &Block) -> Result<Option<BigDecimal>> {
        Ok(None)
    }

    /// Pool shares held by `wallet`.
    fn balance_of(&self, _wallet: Address, _block: &Block) -> Result<Option<BigDecimal>> {
        Ok(None)
    }

    /// Amount of `token` held by the pool.
    fn token_balance(&self, _token: Address, _block: &Block) -> Result<Option<BigDecimal>> {
        Ok(None)
    }
}
