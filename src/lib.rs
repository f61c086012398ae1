pub mod abis;
pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod price;
pub mod utils;
pub mod worker;

pub use chain::{Block, CachedReader, ContractReader, RpcReader};
pub use config::{Network, Settings};
pub use db::{MemoryStore, RecordStore};
pub use error::{Error, Result};
pub use price::{PriceHandler, PriceLookupResult, PriceResolver};
pub use worker::BlockWorker;
