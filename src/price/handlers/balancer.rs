use alloy::primitives::{Address, B256};
use anyhow::anyhow;
use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::{holdings_value, position, HandlerContext, SHARE_DECIMALS};
use crate::{
    abis::{IBalancerVault, IWeightedPool},
    chain::Block,
    error::Result,
    price::{PriceHandler, PriceLookup, PriceLookupResult},
    utils::{checked_div, from_raw},
};

/// On-chain state of a weighted pool at one block.
struct PoolState {
    tokens: Vec<Address>,
    balances: Vec<BigDecimal>,
    weights: Vec<BigDecimal>,
}

/// Balancer weighted pool holding any number of tokens.
///
/// Balances live in the vault, keyed by the 32-byte pool id; normalized
/// weights come from the pool contract, which is also the share token.
/// The spot price of A in B is `(balance_B / weight_B) / (balance_A / weight_A)`.
pub struct BalancerWeightedHandler {
    id: String,
    vault: Address,
    pool_id: B256,
    pool: Address,
    tokens: Vec<Address>,
    context: HandlerContext,
}

impl BalancerWeightedHandler {
    pub fn new(
        vault: Address,
        pool_id: B256,
        pool: Address,
        tokens: Vec<Address>,
        context: HandlerContext,
    ) -> Self {
        Self {
            id: format!("{pool_id:#x}"),
            vault,
            pool_id,
            pool,
            tokens,
            context,
        }
    }

    fn state(&self, block: &Block) -> Result<Option<PoolState>> {
        let call = IBalancerVault::getPoolTokensCall {
            poolId: self.pool_id,
        };
        let Some(pool_tokens) = self.context.read(self.vault, &call, block)? else {
            return Ok(None);
        };
        let Some(raw_weights) =
            self.context
                .read(self.pool, &IWeightedPool::getNormalizedWeightsCall {}, block)?
        else {
            return Ok(None);
        };

        if pool_tokens.tokens.len() != pool_tokens.balances.len()
            || pool_tokens.tokens.len() != raw_weights.len()
        {
            return Err(anyhow!(
                "Pool {} reports {} tokens, {} balances and {} weights",
                self.id,
                pool_tokens.tokens.len(),
                pool_tokens.balances.len(),
                raw_weights.len()
            )
            .into());
        }

        let balances = pool_tokens
            .tokens
            .iter()
            .zip(&pool_tokens.balances)
            .map(|(token, raw)| self.context.amount(*token, *raw))
            .collect::<Result<Vec<_>>>()?;
        let weights = raw_weights
            .iter()
            .map(|raw| from_raw(*raw, SHARE_DECIMALS))
            .collect();

        Ok(Some(PoolState {
            tokens: pool_tokens.tokens,
            balances,
            weights,
        }))
    }
}

impl PriceHandler for BalancerWeightedHandler {
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
        let (balance, weight) = (&state.balances[index], &state.weights[index]);
        if balance.is_zero() || weight.is_zero() {
            return Ok(None);
        }
        let weighted_balance = checked_div(balance, weight)?;

        // First peer with a usable balance and price anchors the quote
        for (peer_index, peer_token) in state.tokens.iter().enumerate() {
            if peer_index == index {
                continue;
            }

            let (peer_balance, peer_weight) =
                (&state.balances[peer_index], &state.weights[peer_index]);
            if peer_balance.is_zero() || peer_weight.is_zero() {
                continue;
            }

            let Some(peer) = lookup.lookup(*peer_token, block, Some(&self.id))? else {
                continue;
            };

            let peer_weighted_balance = checked_div(peer_balance, peer_weight)?;
            let rate = checked_div(&peer_weighted_balance, &weighted_balance)?;
            let price = rate * &peer.price;
            let liquidity = peer_weighted_balance * &peer.price;

            return Ok(Some(PriceLookupResult::new(price, liquidity)));
        }

        Ok(None)
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

        let holdings: Vec<_> = state.tokens.into_iter().zip(state.balances).collect();
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
            .map(|index| state.balances[index].clone()))
    }
}
