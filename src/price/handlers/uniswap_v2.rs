use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::{holdings_value, pool_id, position, HandlerContext};
use crate::{
    abis::{IFraxswapPair, IUniswapV2Pair},
    chain::Block,
    error::Result,
    price::{PriceHandler, PriceLookup, PriceLookupResult},
    utils::checked_div,
};

/// Where the pair's reserves are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReserveSource {
    /// `getReserves()` on a Uniswap V2 pair
    Reserves,
    /// `getReserveAfterTwamm(timestamp)` on a FraxSwap pair, which settles
    /// pending long-term orders first
    AfterTwamm,
}

/// On-chain state of a two-token pair at one block.
struct PairState {
    tokens: [Address; 2],
    reserves: [BigDecimal; 2],
}

/// Constant-product pair (x * y = k).
///
/// The price of one token is the ratio of the reserves times the USD price
/// of the other token: `price_a = reserve_b / reserve_a * price_b`.
/// FraxSwap pairs share the formula and differ only in the reserve accessor.
pub struct UniswapV2Handler {
    id: String,
    pool: Address,
    tokens: Vec<Address>,
    source: ReserveSource,
    context: HandlerContext,
}

impl UniswapV2Handler {
    pub fn new(pool: Address, tokens: Vec<Address>, context: HandlerContext) -> Self {
        Self {
            id: pool_id(&pool),
            pool,
            tokens,
            source: ReserveSource::Reserves,
            context,
        }
    }

    pub fn fraxswap(pool: Address, tokens: Vec<Address>, context: HandlerContext) -> Self {
        Self {
            source: ReserveSource::AfterTwamm,
            ..Self::new(pool, tokens, context)
        }
    }

    /// Read tokens and decimal-adjusted reserves, or `None` if the pair
    /// cannot be read at this block.
    fn state(&self, block: &Block) -> Result<Option<PairState>> {
        let Some(token0) = self.context.read(self.pool, &IUniswapV2Pair::token0Call {}, block)?
        else {
            return Ok(None);
        };
        let Some(token1) = self.context.read(self.pool, &IUniswapV2Pair::token1Call {}, block)?
        else {
            return Ok(None);
        };
        let Some((reserve0, reserve1)) = self.raw_reserves(block)? else {
            return Ok(None);
        };

        Ok(Some(PairState {
            tokens: [token0, token1],
            reserves: [
                self.context.amount(token0, reserve0)?,
                self.context.amount(token1, reserve1)?,
            ],
        }))
    }

    fn raw_reserves(&self, block: &Block) -> Result<Option<(U256, U256)>> {
        let reserves = match self.source {
            ReserveSource::Reserves => self
                .context
                .read(self.pool, &IUniswapV2Pair::getReservesCall {}, block)?
                .map(|r| (U256::from(r.reserve0), U256::from(r.reserve1))),
            ReserveSource::AfterTwamm => {
                let call = IFraxswapPair::getReserveAfterTwammCall {
                    blockTimestamp: U256::from(block.timestamp),
                };
                self.context
                    .read(self.pool, &call, block)?
                    .map(|r| (U256::from(r._reserve0), U256::from(r._reserve1)))
            }
        };

        Ok(reserves)
    }
}

impl PriceHandler for UniswapV2Handler {
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
        let Some(state) = self.state(block)? else {
            debug!("Pair {} unreadable at block {}", self.id, block.number);
            return Ok(None);
        };

        let index = position(&self.id, &state.tokens, token)?;
        let peer_index = 1 - index;
        let reserve = &state.reserves[index];
        let peer_reserve = &state.reserves[peer_index];

        if reserve.is_zero() || peer_reserve.is_zero() {
            debug!("Pair {} has empty reserves at block {}", self.id, block.number);
            return Ok(None);
        }

        let Some(peer) = lookup.lookup(state.tokens[peer_index], block, Some(&self.id))? else {
            return Ok(None);
        };

        let rate = checked_div(peer_reserve, reserve)?;
        let price = rate * &peer.price;
        // Both sides of a constant-product pair hold equal value
        let liquidity = peer_reserve * &peer.price * BigDecimal::from(2);

        Ok(Some(PriceLookupResult::new(price, liquidity)))
    }

    fn total_value(
        &self,
        excluded: &[Address],
        lookup: &dyn PriceLookup,
        block: &Block,
    ) -> Result<Option<BigDecimal>> {
        let Some(state) = self.state(block)? else {
            return Ok(None);
        };

        let [reserve0, reserve1] = state.reserves;
        let holdings = [(state.tokens[0], reserve0), (state.tokens[1], reserve1)];
        holdings_value(&holdings, excluded, lookup, block)
    }

    fn share_supply(&self, block: &Block) -> Result<Option<BigDecimal>> {
        self.context.share_supply(self.pool, block)
    }

    fn balance_of(&self, wallet: Address, block: &Block) -> Result<Option<BigDecimal>> {
        self.context.share_balance(self.pool, wallet, block)
    }

    fn token_balance(&self, token: Address, block: &Block) -> Result<Option<BigDecimal>> {
        let Some(state) = self.state(block)? else {
            return Ok(None);
        };

        Ok(state
            .tokens
            .iter()
            .position(|candidate| *candidate == token)
            .map(|index| state.reserves[index].clone()))
    }
}
