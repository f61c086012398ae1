use bigdecimal::BigDecimal;
use log::debug;
use num_traits::Zero;

use super::BlockWorker;
use crate::{
    abis::{IStakedToken, IStaking},
    chain::Block,
    config::StakingSettings,
    db::{ProtocolMetric, SupplyType, TokenRecord, TokenSupply},
    error::Result,
    utils::{checked_div, from_raw, pow_rounded},
};

/// Rebases per year at three epochs a day.
const REBASES_PER_YEAR: u32 = 1095;

/// Significant digits kept while compounding the APY.
const APY_PRECISION: u64 = 50;

impl BlockWorker {
    /// Roll the block's records up into the daily protocol metric.
    pub fn protocol_metric(
        &self,
        block: &Block,
        records: &[TokenRecord],
        supplies: &[TokenSupply],
    ) -> Result<ProtocolMetric> {
        let ohm_price = self.resolver.usd_rate(self.network.protocol_token, block)?;

        let total_supply = sum_supply(supplies, |supply_type| supply_type == SupplyType::TotalSupply);
        let circulating_supply = sum_supply(supplies, SupplyType::counts_toward_circulating);
        let floating_supply = sum_supply(supplies, |_| true);

        let treasury_market_value: BigDecimal = records.iter().map(|record| &record.value).sum();
        let treasury_liquid_backing: BigDecimal = records
            .iter()
            .filter(|record| record.is_liquid)
            .map(|record| &record.value_excluding_ohm)
            .sum();
        let backing_per_floating = if floating_supply.is_zero() {
            BigDecimal::zero()
        } else {
            checked_div(&treasury_liquid_backing, &floating_supply)?
        };

        let (current_index, current_apy) = match &self.network.staking {
            Some(staking) => (self.index(staking, block)?, self.apy(staking, block)?),
            None => (None, None),
        };
        let gohm_price = current_index.as_ref().map(|index| &ohm_price * index);

        Ok(ProtocolMetric {
            date: block.date(),
            block: block.number,
            timestamp: block.timestamp,
            market_cap: &ohm_price * &circulating_supply,
            ohm_price,
            gohm_price,
            total_supply,
            ohm_circulating_supply: circulating_supply,
            ohm_floating_supply: floating_supply,
            treasury_market_value,
            treasury_liquid_backing,
            treasury_liquid_backing_per_ohm_floating: backing_per_floating,
            current_index,
            current_apy,
        })
    }

    fn index(&self, staking: &StakingSettings, block: &Block) -> Result<Option<BigDecimal>> {
        Ok(self
            .context
            .read(staking.staking, &IStaking::indexCall {}, block)?
            .map(|raw| from_raw(raw, staking.index_decimals)))
    }

    /// Compounded yearly yield of the next rebase, in percent.
    fn apy(&self, staking: &StakingSettings, block: &Block) -> Result<Option<BigDecimal>> {
        let Some(epoch) = self.context.read(staking.staking, &IStaking::epochCall {}, block)? else {
            return Ok(None);
        };
        let Some(raw_circulating) = self.context.read(
            staking.staked_token,
            &IStakedToken::circulatingSupplyCall {},
            block,
        )?
        else {
            return Ok(None);
        };

        let circulating = from_raw(raw_circulating, staking.staked_decimals);
        if circulating.is_zero() {
            debug!("Nothing staked at block {}", block.number);
            return Ok(None);
        }

        let distribute = from_raw(epoch.distribute, staking.staked_decimals);
        let rebase = checked_div(&distribute, &circulating)?;
        let growth = pow_rounded(&(BigDecimal::from(1) + rebase), REBASES_PER_YEAR, APY_PRECISION);

        Ok(Some((growth - BigDecimal::from(1)) * BigDecimal::from(100)))
    }
}

fn sum_supply(supplies: &[TokenSupply], include: impl Fn(SupplyType) -> bool) -> BigDecimal {
    supplies
        .iter()
        .filter(|supply| include(supply.supply_type))
        .map(|supply| &supply.supply_balance)
        .sum()
}
