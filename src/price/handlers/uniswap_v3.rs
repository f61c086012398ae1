use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use log::debug;

use super::{holdings_value, pool_id, position, HandlerContext};
use crate::{
    abis::IUniswapV3Pool,
    chain::Block,
    error::Result,
    price::{PriceHandler, PriceLookup, PriceLookupResult},
    utils::{checked_div, sqrt_price_x96_to_price},
};

/// Concentrated-liquidity pool priced from the `slot0` square-root price.
///
/// `sqrtPriceX96^2 / 2^192`, adjusted for the decimal difference, is the
/// price of token0 in token1. Positions are NFTs, so the pool has no
/// fungible share token and no unit price.
pub struct UniswapV3Handler {
    id: String,
    pool: Address,
    tokens: Vec<Address>,
    context: HandlerContext,
}

impl UniswapV3Handler {
    pub fn new(pool: Address, tokens: Vec<Address>, context: HandlerContext) -> Self {
        Self {
            id: pool_id(&pool),
            pool,
            tokens,
            context,
        }
    }

    fn pool_tokens(&self, block: &Block) -> Result<Option<[Address; 2]>> {
        let Some(token0) = self.context.read(self.pool, &IUniswapV3Pool::token0Call {}, block)?
        else {
            return Ok(None);
        };
        let Some(token1) = self.context.read(self.pool, &IUniswapV3Pool::token1Call {}, block)?
        else {
            return Ok(None);
        };

        Ok(Some([token0, token1]))
    }

    /// Decimal price of token0 denominated in token1.
    fn token0_price(&self, tokens: &[Address; 2], block: &Block) -> Result<Option<BigDecimal>> {
        let Some(slot0) = self.context.read(self.pool, &IUniswapV3Pool::slot0Call {}, block)? else {
            return Ok(None);
        };

        Ok(sqrt_price_x96_to_price(
            U256::from(slot0.sqrtPriceX96),
            self.context.decimals(tokens[0])?,
            self.context.decimals(tokens[1])?,
        ))
    }
}

impl PriceHandler for UniswapV3Handler {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, token: Address) -> bool {
        self.tokens.contains(&token)
    }

    fn price(
        &self,
        token: Address,
        lookup: &dyn PriceLookup,
        block: &Block,
    ) -> Result<Option<PriceLookupResult>> {
        let Some(tokens) = self.pool_tokens(block)? else {
            debug!("Pool {} unreadable at block {}", self.id, block.number);
            return Ok(None);
        };

        let index = position(&self.id, &tokens, token)?;
        let peer_token = tokens[1 - index];

        let Some(token0_price) = self.token0_price(&tokens, block)? else {
            debug!("Pool {} is not initialised at block {}", self.id, block.number);
            return Ok(None);
        };

        // Peer tokens received per token
        let rate = if index == 0 {
            token0_price
        } else {
            checked_div(&BigDecimal::from(1), &token0_price)?
        };

        let Some(peer) = lookup.lookup(peer_token, block, Some(&self.id))? else {
            return Ok(None);
        };

        let price = rate * &peer.price;
        let balance = self.context.erc20_balance(token, self.pool, block)?;
        let peer_balance = self.context.erc20_balance(peer_token, self.pool, block)?;
        let liquidity = &balance * &price + &peer_balance * &peer.price;

        Ok(Some(PriceLookupResult::new(price, liquidity)))
    }

    fn total_value(
        &self,
        excluded: &[Address],
        lookup: &dyn PriceLookup,
        block: &Block,
    ) -> Result<Option<BigDecimal>> {
        let Some(tokens) = self.pool_tokens(block)? else {
            return Ok(None);
        };

        let holdings = tokens
            .iter()
            .map(|token| Ok((*token, self.context.erc20_balance(*token, self.pool, block)?)))
            .collect::<Result<Vec<_>>>()?;

        holdings_value(&holdings, excluded, lookup, block)
    }

    fn unit_price(&self, _lookup: &dyn PriceLookup, _block: &Block) -> Result<Option<BigDecimal>> {
        Ok(None)
    }

    fn token_balance(&self, token: Address, block: &Block) -> Result<Option<BigDecimal>> {
        Ok(Some(self.context.erc20_balance(token, self.pool, block)?))
    }
}
