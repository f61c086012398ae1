use log::{debug, warn};
use num_traits::Zero;

use super::BlockWorker;
use crate::{
    abis::IERC20,
    chain::Block,
    db::{SupplyType, TokenSupply},
    error::Result,
};

impl BlockWorker {
    /// Supply entries of the protocol token: the total supply, less what
    /// treasury wallets hold, configured offsets and protocol-owned pools.
    pub fn token_supplies(&self, block: &Block) -> Result<Vec<TokenSupply>> {
        let protocol = self.network.protocol_token()?;
        let entry = |supply_type, balance| {
            TokenSupply::new(block, protocol.name.clone(), protocol.address, supply_type, balance)
        };
        let mut supplies = Vec::new();

        match self
            .context
            .read(protocol.address, &IERC20::totalSupplyCall {}, block)?
        {
            Some(raw) => {
                let total = self.context.amount(protocol.address, raw)?;
                supplies.push(entry(SupplyType::TotalSupply, total));
            }
            None => warn!("{} total supply unavailable at block {}", protocol.name, block.number),
        }

        for wallet in &self.network.wallets {
            let balance = self
                .context
                .erc20_balance(protocol.address, wallet.address, block)?;
            if !balance.is_zero() {
                supplies.push(
                    entry(SupplyType::Treasury, balance)
                        .with_source(wallet.name.clone(), wallet.address),
                );
            }
        }

        for offset in &self.network.supply_offsets {
            if offset.is_active(block) {
                supplies.push(
                    entry(SupplyType::Offset, offset.balance.clone())
                        .with_source(offset.source.clone(), offset.address),
                );
            }
        }

        for pool in self.network.protocol_owned_pools() {
            let Some(pool_address) = pool.address() else {
                continue;
            };

            for (wallet, balance) in self.protocol_liquidity(pool, block)? {
                if balance.is_zero() {
                    continue;
                }
                debug!(
                    "{} owns {balance} {} in {}",
                    wallet.name,
                    protocol.name,
                    pool.display_name()
                );

                supplies.push(
                    entry(SupplyType::Liquidity, balance)
                        .with_pool(pool.display_name(), pool_address)
                        .with_source(wallet.name.clone(), wallet.address),
                );
            }
        }

        Ok(supplies)
    }
}
