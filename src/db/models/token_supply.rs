use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::chain::Block;

/// What a supply entry measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupplyType {
    TotalSupply,
    Treasury,
    Offset,
    Liquidity,
}

impl SupplyType {
    /// +1 for entries that add to circulating supply, -1 for deductions.
    pub fn sign(self) -> i8 {
        match self {
            SupplyType::TotalSupply => 1,
            SupplyType::Treasury | SupplyType::Offset | SupplyType::Liquidity => -1,
        }
    }

    /// Whether the entry is netted into circulating supply. Floating supply
    /// nets every type.
    pub fn counts_toward_circulating(self) -> bool {
        !matches!(self, SupplyType::Liquidity)
    }
}

/// Quantity of the protocol token that adds to or deducts from supply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSupply {
    pub date: String,
    pub block: u64,
    pub timestamp: u64,
    pub token: String,
    pub token_address: Address,
    pub pool: Option<String>,
    pub pool_address: Option<Address>,
    pub source: Option<String>,
    pub source_address: Option<Address>,
    #[serde(rename = "type")]
    pub supply_type: SupplyType,
    pub balance: BigDecimal,
    /// `balance` with the sign of `supply_type` applied
    pub supply_balance: BigDecimal,
}

impl TokenSupply {
    pub fn new(
        block: &Block,
        token: String,
        token_address: Address,
        supply_type: SupplyType,
        balance: BigDecimal,
    ) -> Self {
        let supply_balance = &balance * BigDecimal::from(supply_type.sign());

        Self {
            date: block.date(),
            block: block.number,
            timestamp: block.timestamp,
            token,
            token_address,
            pool: None,
            pool_address: None,
            source: None,
            source_address: None,
            supply_type,
            balance,
            supply_balance,
        }
    }

    pub fn with_pool(mut self, pool: String, pool_address: Address) -> Self {
        self.pool = Some(pool);
        self.pool_address = Some(pool_address);
        self
    }

    pub fn with_source(mut self, source: String, source_address: Address) -> Self {
        self.source = Some(source);
        self.source_address = Some(source_address);
        self
    }

    pub fn id(&self) -> String {
        format!(
            "{}/{}/{:?}/{}/{}",
            self.date,
            self.token,
            self.supply_type,
            self.pool.as_deref().unwrap_or_default(),
            self.source.as_deref().unwrap_or_default()
        )
    }
}
