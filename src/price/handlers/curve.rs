use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::{holdings_value, pool_id, position, HandlerContext};
use crate::{
    abis::ICurvePool,
    chain::Block,
    error::Result,
    price::{PriceHandler, PriceLookup, PriceLookupResult},
    utils::checked_div,
};

/// Coins and balances of a two-token pool at one block.
struct PoolState {
    tokens: [Address; 2],
    balances: [BigDecimal; 2],
}

/// Two-token Curve stable pool.
///
/// Members trade near parity, so the rate is the plain balance ratio with
/// no weight adjustment. The LP token is a separate contract.
pub struct CurveHandler {
    id: String,
    pool: Address,
    lp_token: Address,
    tokens: Vec<Address>,
    context: HandlerContext,
}

impl CurveHandler {
    pub fn new(pool: Address, lp_token: Address, tokens: Vec<Address>, context: HandlerContext) -> Self {
        Self {
            id: pool_id(&pool),
            pool,
            lp_token,
            tokens,
            context,
        }
    }

    fn state(&self, block: &Block) -> Result<Option<PoolState>> {
        let mut tokens = [Address::ZERO; 2];
        let mut balances = [BigDecimal::zero(), BigDecimal::zero()];

        for i in 0..2 {
            let index = U256::from(i);
            let Some(coin) = self.context.read(self.pool, &ICurvePool::coinsCall { i: index }, block)?
            else {
                return Ok(None);
            };
            let Some(raw) = self.context.read(self.pool, &ICurvePool::balancesCall { i: index }, block)?
            else {
                return Ok(None);
            };

            tokens[i] = coin;
            balances[i] = self.context.amount(coin, raw)?;
        }

        Ok(Some(PoolState { tokens, balances }))
    }
}

impl PriceHandler for CurveHandler {
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
            debug!("Pool {} unreadable at block {}", self.id, block.number);
            return Ok(None);
        };

        let index = position(&self.id, &state.tokens, token)?;
        let peer_index = 1 - index;
        if state.balances[index].is_zero() || state.balances[peer_index].is_zero() {
            return Ok(None);
        }

        let Some(peer) = lookup.lookup(state.tokens[peer_index], block, Some(&self.id))? else {
            return Ok(None);
        };

        let rate = checked_div(&state.balances[peer_index], &state.balances[index])?;
        let price = rate * &peer.price;
        let liquidity = &state.balances[index] * &price + &state.balances[peer_index] * &peer.price;

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

        let [token0, token1] = state.tokens;
        let [balance0, balance1] = state.balances;
        holdings_value(&[(token0, balance0), (token1, balance1)], excluded, lookup, block)
    }

    fn share_supply(&self, block: &Block) -> Result<Option<BigDecimal>> {
        self.context.share_supply(self.lp_token, block)
    }

    fn balance_of(&self, wallet: Address, block: &Block) -> Result<Option<BigDecimal>> {
        self.context.share_balance(self.lp_token, wallet, block)
    }

    fn token_balance(&self, token: Address, block: &Block) -> Result<Option<BigDecimal>> {
        let Some(state) = self.state(block)? else {
            return Ok(None);
        };

        Ok(state
            .tokens
            .iter()
            .position(|candidate| *candidate == token)
            .map(|index| state.balances[index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::address;

    use super::*;
    use crate::{
        abis::IERC20,
        chain::mock::MockChain,
        error::Error,
        price::handlers::testing::{
            assert_close, catalog, dec, raw_amount, shares, Oracle, BLOCK, DAI, FRAX, USDC,
        },
    };

    const POOL: Address = address!("0xdcef968d416a41cdac0ed8702fac8128a64241a2");
    const LP_TOKEN: Address = address!("0x3175df0976dfa876431c2e9ee6bc45b65d3473cc");

    /// FRAX (18 decimals) / USDC (6 decimals) pool, 0.998 USDC per FRAX.
    fn pool_chain() -> MockChain {
        let mut chain = MockChain::new();
        chain
            .on(POOL, ICurvePool::coinsCall { i: U256::ZERO }, &FRAX)
            .on(POOL, ICurvePool::coinsCall { i: U256::from(1) }, &USDC)
            .on(
                POOL,
                ICurvePool::balancesCall { i: U256::ZERO },
                &raw_amount("500000", 18),
            )
            .on(
                POOL,
                ICurvePool::balancesCall { i: U256::from(1) },
                &raw_amount("499000", 6),
            )
            .on(LP_TOKEN, IERC20::totalSupplyCall {}, &shares("990000"));
        chain
    }

    fn handler(chain: MockChain, tokens: Vec<Address>) -> CurveHandler {
        let context = HandlerContext::new(Arc::new(chain), Arc::new(catalog()));
        CurveHandler::new(POOL, LP_TOKEN, tokens, context)
    }

    #[test]
    fn test_price_from_balance_ratio() {
        let handler = handler(pool_chain(), vec![FRAX, USDC]);
        let oracle = Oracle::new(&[(USDC, "1")]);

        let quote = handler.price(FRAX, &oracle, &BLOCK).unwrap().unwrap();
        assert_eq!(quote.price, dec("0.998"));
        assert_eq!(quote.liquidity, dec("998000"));
        assert_eq!(oracle.seen_pools.borrow().as_slice(), &[Some(pool_id(&POOL))]);

        let quote = handler
            .price(USDC, &Oracle::new(&[(FRAX, "1")]), &BLOCK)
            .unwrap()
            .unwrap();
        assert_close(&quote.price, &(dec("500000") / dec("499000")));
    }

    #[test]
    fn test_prices_are_reciprocal() {
        let handler = handler(pool_chain(), vec![FRAX, USDC]);

        let frax_in_usdc = handler
            .price(FRAX, &Oracle::new(&[(USDC, "1")]), &BLOCK)
            .unwrap()
            .unwrap()
            .price;
        let usdc_in_frax = handler
            .price(USDC, &Oracle::new(&[(FRAX, "1")]), &BLOCK)
            .unwrap()
            .unwrap()
            .price;

        assert_close(&(frax_in_usdc * usdc_in_frax), &dec("1"));
    }

    #[test]
    fn test_unpriced_peer_has_no_price() {
        let handler = handler(pool_chain(), vec![FRAX, USDC]);
        let oracle = Oracle::new(&[(FRAX, "1")]);

        assert_eq!(handler.price(FRAX, &oracle, &BLOCK).unwrap(), None);
        assert_eq!(handler.total_value(&[], &oracle, &BLOCK).unwrap(), None);
    }

    #[test]
    fn test_configured_token_missing_on_chain() {
        let handler = handler(pool_chain(), vec![FRAX, USDC, DAI]);
        let oracle = Oracle::new(&[(FRAX, "1"), (USDC, "1")]);

        let result = handler.price(DAI, &oracle, &BLOCK);
        assert!(matches!(result, Err(Error::TokenNotInPool { token, .. }) if token == DAI));
    }

    #[test]
    fn test_lp_unit_price() {
        let handler = handler(pool_chain(), vec![FRAX, USDC]);
        let oracle = Oracle::new(&[(FRAX, "0.99"), (USDC, "1")]);

        let total = handler.total_value(&[], &oracle, &BLOCK).unwrap().unwrap();
        assert_eq!(total, dec("994000"));

        let unit_price = handler.unit_price(&oracle, &BLOCK).unwrap().unwrap();
        assert_close(&unit_price, &(dec("994000") / dec("990000")));

        assert_eq!(handler.total_value(&[FRAX], &oracle, &BLOCK).unwrap(), Some(dec("499000")));
    }

    #[test]
    fn test_empty_pool() {
        let mut chain = MockChain::new();
        chain
            .on(POOL, ICurvePool::coinsCall { i: U256::ZERO }, &FRAX)
            .on(POOL, ICurvePool::coinsCall { i: U256::from(1) }, &USDC)
            .on(POOL, ICurvePool::balancesCall { i: U256::ZERO }, &U256::ZERO)
            .on(POOL, ICurvePool::balancesCall { i: U256::from(1) }, &U256::ZERO);
        let handler = handler(chain, vec![FRAX, USDC]);
        let oracle = Oracle::new(&[(USDC, "1")]);

        assert_eq!(handler.price(FRAX, &oracle, &BLOCK).unwrap(), None);
        assert_eq!(handler.total_value(&[], &oracle, &BLOCK).unwrap(), Some(dec("0")));
        assert_eq!(handler.unit_price(&oracle, &BLOCK).unwrap(), None);
    }
}
