use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::BlockWorker;
use crate::{
    chain::Block,
    config::{Category, PoolSettings, Wallet},
    db::TokenRecord,
    error::Result,
    price::PriceHandler,
    utils::checked_div,
};

impl BlockWorker {
    /// Protocol-owned liquidity: one record per pool share position held by
    /// a treasury wallet, valued at the pool's unit price.
    ///
    /// The multiplier is the part of the pool's value not made of the
    /// protocol token, so `value_excluding_ohm` counts only real backing.
    pub fn liquidity_records(&self, block: &Block) -> Result<Vec<TokenRecord>> {
        let mut records = Vec::new();

        for pool in self.network.protocol_owned_pools() {
            let (Some(handler), Some(pool_address)) =
                (self.resolver.handler(&pool.id()), pool.address())
            else {
                continue;
            };

            let holdings = self.share_holdings(handler, block)?;
            if holdings.is_empty() {
                debug!("No wallet holds {} shares", pool.display_name());
                continue;
            }

            let unit_price = handler.unit_price(&self.resolver, block)?;
            let unit_price = self
                .resolver
                .policy()
                .apply(&pool.display_name(), block, unit_price)?;
            let multiplier = self.non_protocol_share(handler, block)?;

            for (wallet, shares) in holdings {
                debug!(
                    "{} holds {shares} {} shares at {unit_price}",
                    wallet.name,
                    pool.display_name()
                );

                records.push(TokenRecord::new(
                    block,
                    pool.display_name(),
                    pool_address,
                    wallet.name.clone(),
                    wallet.address,
                    unit_price.clone(),
                    shares,
                    multiplier.clone(),
                    Category::ProtocolOwnedLiquidity,
                    true,
                    false,
                    self.network.blockchain.clone(),
                ));
            }
        }

        Ok(records)
    }

    /// Non-zero pool share balances of the treasury wallets.
    pub(crate) fn share_holdings(
        &self,
        handler: &dyn PriceHandler,
        block: &Block,
    ) -> Result<Vec<(&Wallet, BigDecimal)>> {
        let mut holdings = Vec::new();

        for wallet in &self.network.wallets {
            match handler.balance_of(wallet.address, block)? {
                Some(shares) if !shares.is_zero() => holdings.push((wallet, shares)),
                _ => {}
            }
        }

        Ok(holdings)
    }

    /// Fraction of the pool's value not made of the protocol token, zero
    /// when the pool cannot be valued.
    fn non_protocol_share(&self, handler: &dyn PriceHandler, block: &Block) -> Result<BigDecimal> {
        let Some(total) = handler.total_value(&[], &self.resolver, block)? else {
            return Ok(BigDecimal::zero());
        };
        if total.is_zero() {
            return Ok(BigDecimal::zero());
        }

        let excluded = [self.network.protocol_token];
        let Some(backing) = handler.total_value(&excluded, &self.resolver, block)? else {
            return Ok(BigDecimal::zero());
        };

        checked_div(&backing, &total)
    }

    /// Protocol tokens held by a pool, attributed to each treasury wallet
    /// in proportion to its shares.
    pub(crate) fn protocol_liquidity(
        &self,
        pool: &PoolSettings,
        block: &Block,
    ) -> Result<Vec<(&Wallet, BigDecimal)>> {
        let Some(handler) = self.resolver.handler(&pool.id()) else {
            return Ok(Vec::new());
        };
        let Some(reserve) = handler.token_balance(self.network.protocol_token, block)? else {
            return Ok(Vec::new());
        };
        let supply = match handler.share_supply(block)? {
            Some(supply) if !supply.is_zero() => supply,
            _ => return Ok(Vec::new()),
        };

        self.share_holdings(handler, block)?
            .into_iter()
            .map(|(wallet, shares)| {
                checked_div(&(&reserve * shares), &supply).map(|owned| (wallet, owned))
            })
            .collect()
    }
}
