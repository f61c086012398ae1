use crate::error::Result;

pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::{ProtocolMetric, SupplyType, TokenRecord, TokenSupply};

/// Destination for the records computed for a block.
///
/// Every save is an upsert by the record's id: recomputing a day replaces
/// that day's records, last write wins.
pub trait RecordStore {
    fn save_token_record(&mut self, record: TokenRecord) -> Result<()>;

    fn save_token_supply(&mut self, supply: TokenSupply) -> Result<()>;

    fn save_protocol_metric(&mut self, metric: ProtocolMetric) -> Result<()>;

    fn token_record(&self, id: &str) -> Option<&TokenRecord>;

    fn token_supply(&self, id: &str) -> Option<&TokenSupply>;

    fn protocol_metric(&self, id: &str) -> Option<&ProtocolMetric>;
}
