use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::{chain::Block, config::Category};

/// Valued holding of one token by one source (wallet or liquidity pool)
/// on one day.
///
/// Key: `date/source/token`. Recomputing the same day overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub date: String,
    pub block: u64,
    pub timestamp: u64,
    pub token: String,
    pub token_address: Address,
    pub source: String,
    pub source_address: Address,
    /// USD price of one unit
    pub rate: BigDecimal,
    pub balance: BigDecimal,
    /// Share of the value not made of the protocol token, in [0, 1]
    pub multiplier: BigDecimal,
    pub category: Category,
    pub is_liquid: bool,
    pub is_bluechip: bool,
    pub blockchain: String,
    pub value: BigDecimal,
    pub value_excluding_ohm: BigDecimal,
}

impl TokenRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        block: &Block,
        token: String,
        token_address: Address,
        source: String,
        source_address: Address,
        rate: BigDecimal,
        balance: BigDecimal,
        multiplier: BigDecimal,
        category: Category,
        is_liquid: bool,
        is_bluechip: bool,
        blockchain: String,
    ) -> Self {
        let value = &balance * &rate;
        let value_excluding_ohm = &value * &multiplier;

        Self {
            date: block.date(),
            block: block.number,
            timestamp: block.timestamp,
            token,
            token_address,
            source,
            source_address,
            rate,
            balance,
            multiplier,
            category,
            is_liquid,
            is_bluechip,
            blockchain,
            value,
            value_excluding_ohm,
        }
    }

    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.date, self.source, self.token)
    }
}
