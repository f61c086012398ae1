pub mod protocol_metric;
pub mod token_record;
pub mod token_supply;

pub use protocol_metric::ProtocolMetric;
pub use token_record::TokenRecord;
pub use token_supply::{SupplyType, TokenSupply};
