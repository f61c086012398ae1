#[allow(clippy::module_inception)]
pub mod config;
pub mod network;

pub use config::{IndexerSettings, LoggingSettings, RpcSettings, Settings};
pub use network::{
    Category, Network, NetworkSettings, PoolKind, PoolSettings, StakingSettings, SupplyOffset,
    TokenCatalog, TokenInfo, Wallet,
};
