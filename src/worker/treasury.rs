use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::BlockWorker;
use crate::{
    chain::Block,
    config::Category,
    db::TokenRecord,
    error::Result,
};

impl BlockWorker {
    /// Treasury holdings of every stable and volatile token, one record per
    /// wallet holding a non-zero balance.
    ///
    /// The protocol token is not treasury value and is left out. A token's
    /// price is only resolved when some wallet holds it.
    pub fn token_records(&self, block: &Block) -> Result<Vec<TokenRecord>> {
        let mut records = Vec::new();

        for token in self.network.tokens.iter() {
            if token.category == Category::ProtocolOwnedLiquidity
                || token.address == self.network.protocol_token
            {
                continue;
            }

            let mut cached_rate: Option<BigDecimal> = None;

            for wallet in &self.network.wallets {
                let balance = self.context.erc20_balance(token.address, wallet.address, block)?;
                if balance.is_zero() {
                    continue;
                }

                let rate = match cached_rate.clone() {
                    Some(rate) => rate,
                    None => {
                        let rate = self.resolver.usd_rate(token.address, block)?;
                        cached_rate = Some(rate.clone());
                        rate
                    }
                };
                debug!("{} holds {balance} {} at {rate}", wallet.name, token.name);

                records.push(TokenRecord::new(
                    block,
                    token.name.clone(),
                    token.address,
                    wallet.name.clone(),
                    wallet.address,
                    rate,
                    balance,
                    BigDecimal::from(1),
                    token.category,
                    token.is_liquid,
                    token.is_bluechip,
                    self.network.blockchain.clone(),
                ));
            }
        }

        Ok(records)
    }
}
