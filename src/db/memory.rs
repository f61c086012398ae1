use std::collections::BTreeMap;

use anyhow::Context;
use serde::Serialize;

use super::{ProtocolMetric, RecordStore, TokenRecord, TokenSupply};
use crate::error::Result;

/// In-memory record store, ordered by id.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStore {
    token_records: BTreeMap<String, TokenRecord>,
    token_supplies: BTreeMap<String, TokenSupply>,
    protocol_metrics: BTreeMap<String, ProtocolMetric>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_records(&self) -> impl Iterator<Item = &TokenRecord> {
        self.token_records.values()
    }

    pub fn token_supplies(&self) -> impl Iterator<Item = &TokenSupply> {
        self.token_supplies.values()
    }

    pub fn protocol_metrics(&self) -> impl Iterator<Item = &ProtocolMetric> {
        self.protocol_metrics.values()
    }

    /// Every stored record as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).context("Failed to serialize records")?)
    }
}

impl RecordStore for MemoryStore {
    fn save_token_record(&mut self, record: TokenRecord) -> Result<()> {
        self.token_records.insert(record.id(), record);
        Ok(())
    }

    fn save_token_supply(&mut self, supply: TokenSupply) -> Result<()> {
        self.token_supplies.insert(supply.id(), supply);
        Ok(())
    }

    fn save_protocol_metric(&mut self, metric: ProtocolMetric) -> Result<()> {
        self.protocol_metrics.insert(metric.id(), metric);
        Ok(())
    }

    fn token_record(&self, id: &str) -> Option<&TokenRecord> {
        self.token_records.get(id)
    }

    fn token_supply(&self, id: &str) -> Option<&TokenSupply> {
        self.token_supplies.get(id)
    }

    fn protocol_metric(&self, id: &str) -> Option<&ProtocolMetric> {
        self.protocol_metrics.get(id)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::{
        chain::Block,
        config::Category,
        db::SupplyType,
        price::handlers::testing::{dec, BLOCK, DAI, OHM},
    };

    fn dai_record(block: &Block, balance: &str) -> TokenRecord {
        TokenRecord::new(
            block,
            "DAI".to_string(),
            DAI,
            "Treasury".to_string(),
            Address::ZERO,
            dec("1"),
            dec(balance),
            dec("1"),
            Category::Stable,
            true,
            false,
            "Ethereum".to_string(),
        )
    }

    #[test]
    fn test_same_day_overwrites() {
        let mut store = MemoryStore::new();
        store.save_token_record(dai_record(&BLOCK, "10")).unwrap();
        store
            .save_token_record(dai_record(&Block::new(BLOCK.number + 100, BLOCK.timestamp + 1200), "25"))
            .unwrap();
        store
            .save_token_record(dai_record(&Block::new(BLOCK.number + 7200, BLOCK.timestamp + 86_400), "30"))
            .unwrap();

        assert_eq!(store.token_records().count(), 2);
        let today = store.token_record("2022-11-09/Treasury/DAI").unwrap();
        assert_eq!(today.balance, dec("25"));
        assert_eq!(today.block, BLOCK.number + 100);
        assert!(store.token_record("2022-11-10/Treasury/DAI").is_some());
    }

    #[test]
    fn test_json_export() {
        let mut store = MemoryStore::new();
        let supply = TokenSupply::new(&BLOCK, "OHM".to_string(), OHM, SupplyType::TotalSupply, dec("5"));
        let id = supply.id();
        store.save_token_supply(supply).unwrap();

        assert!(store.token_supply(&id).is_some());
        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["tokenSupplies"][&id]["supplyBalance"], "5");
        assert_eq!(json["tokenSupplies"][&id]["type"], "TotalSupply");
    }
}
