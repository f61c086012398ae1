//! Static per-network catalog: tokens, pools, wallets and supply offsets.
//!
//! Deserialized from the `network` section of the settings, validated once
//! by [`Network::from_settings`] and then shared immutably by the resolver
//! and the aggregators.

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use anyhow::{bail, ensure};
use bigdecimal::BigDecimal;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{Block, ContractReader},
    error::{Error, Result},
    price::{
        handlers::pool_id, BalancerWeightedHandler, CurveHandler, CustomMappingHandler,
        HandlerContext, MissingPricePolicy, PriceHandler, PriceResolver, StablecoinHandler,
        UniswapV2Handler, UniswapV3Handler, DEFAULT_MAX_DEPTH,
    },
};

/// Treasury category a token (or liquidity position) is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stable,
    Volatile,
    ProtocolOwnedLiquidity,
}

/// Token metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub address: Address,
    pub decimals: u8,
    pub category: Category,
    #[serde(default = "default_true")]
    pub is_liquid: bool,
    #[serde(default)]
    pub is_bluechip: bool,
}

fn default_true() -> bool {
    true
}

/// Token metadata indexed by address.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    tokens: Vec<TokenInfo>,
    by_address: FxHashMap<Address, usize>,
}

impl TokenCatalog {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        let by_address = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| (token.address, index))
            .collect();

        Self { tokens, by_address }
    }

    pub fn get(&self, token: Address) -> Option<&TokenInfo> {
        self.by_address.get(&token).map(|index| &self.tokens[*index])
    }

    pub fn decimals(&self, token: Address) -> Result<u8> {
        self.get(token)
            .map(|info| info.decimals)
            .ok_or(Error::UnknownToken(token))
    }

    /// Tokens in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.iter()
    }
}

/// Treasury-controlled address whose holdings are valued.
#[derive(Debug, Clone, Deserialize)]
pub struct Wallet {
    pub name: String,
    pub address: Address,
}

/// Protocol tokens excluded from circulating supply that no balance read
/// can find, such as tokens locked by a migration.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplyOffset {
    pub source: String,
    pub address: Address,
    pub balance: BigDecimal,
    #[serde(default)]
    pub from_block: u64,
    #[serde(default)]
    pub to_block: Option<u64>,
}

impl SupplyOffset {
    pub fn is_active(&self, block: &Block) -> bool {
        block.number >= self.from_block && self.to_block.map_or(true, |to| block.number <= to)
    }
}

/// Staking contracts, when the network has them.
#[derive(Debug, Clone, Deserialize)]
pub struct StakingSettings {
    /// Exposes `index()` and `epoch()`
    pub staking: Address,
    /// Rebasing staked token exposing `circulatingSupply()`
    pub staked_token: Address,
    #[serde(default = "default_staking_decimals")]
    pub index_decimals: u8,
    #[serde(default = "default_staking_decimals")]
    pub staked_decimals: u8,
}

fn default_staking_decimals() -> u8 {
    9
}

/// Pool topology and the addresses needed to read it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolKind {
    UniswapV2 {
        pool: Address,
        tokens: Vec<Address>,
    },
    UniswapV3 {
        pool: Address,
        tokens: Vec<Address>,
    },
    BalancerWeighted {
        vault: Address,
        pool_id: B256,
        pool: Address,
        tokens: Vec<Address>,
    },
    Curve {
        pool: Address,
        lp_token: Address,
        tokens: Vec<Address>,
    },
    Fraxswap {
        pool: Address,
        tokens: Vec<Address>,
    },
    Stablecoin {
        id: String,
        tokens: Vec<Address>,
    },
    CustomMapping {
        derivative: Address,
        underlying: Address,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSettings {
    #[serde(flatten)]
    pub kind: PoolKind,
    #[serde(default)]
    pub name: Option<String>,
    /// Held by the treasury as protocol-owned liquidity
    #[serde(default)]
    pub protocol_owned: bool,
}

impl PoolSettings {
    /// Id of the handler built for this pool.
    pub fn id(&self) -> String {
        match &self.kind {
            PoolKind::UniswapV2 { pool, .. }
            | PoolKind::UniswapV3 { pool, .. }
            | PoolKind::Curve { pool, .. }
            | PoolKind::Fraxswap { pool, .. } => pool_id(pool),
            PoolKind::BalancerWeighted { pool_id, .. } => format!("{pool_id:#x}"),
            PoolKind::Stablecoin { id, .. } => id.clone(),
            PoolKind::CustomMapping { derivative, .. } => pool_id(derivative),
        }
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id())
    }

    /// Contract recorded as the source of a liquidity position.
    pub fn address(&self) -> Option<Address> {
        match &self.kind {
            PoolKind::UniswapV2 { pool, .. }
            | PoolKind::UniswapV3 { pool, .. }
            | PoolKind::BalancerWeighted { pool, .. }
            | PoolKind::Curve { pool, .. }
            | PoolKind::Fraxswap { pool, .. } => Some(*pool),
            PoolKind::Stablecoin { .. } => None,
            PoolKind::CustomMapping { derivative, .. } => Some(*derivative),
        }
    }

    /// Tokens whose decimals the handler needs.
    fn priced_tokens(&self) -> &[Address] {
        match &self.kind {
            PoolKind::UniswapV2 { tokens, .. }
            | PoolKind::UniswapV3 { tokens, .. }
            | PoolKind::BalancerWeighted { tokens, .. }
            | PoolKind::Curve { tokens, .. }
            | PoolKind::Fraxswap { tokens, .. } => tokens,
            PoolKind::Stablecoin { .. } | PoolKind::CustomMapping { .. } => &[],
        }
    }

    pub fn handler(&self, context: &HandlerContext) -> Box<dyn PriceHandler> {
        let context = context.clone();

        match &self.kind {
            PoolKind::UniswapV2 { pool, tokens } => {
                Box::new(UniswapV2Handler::new(*pool, tokens.clone(), context))
            }
            PoolKind::UniswapV3 { pool, tokens } => {
                Box::new(UniswapV3Handler::new(*pool, tokens.clone(), context))
            }
            PoolKind::BalancerWeighted {
                vault,
                pool_id,
                pool,
                tokens,
            } => Box::new(BalancerWeightedHandler::new(
                *vault,
                *pool_id,
                *pool,
                tokens.clone(),
                context,
            )),
            PoolKind::Curve {
                pool,
                lp_token,
                tokens,
            } => Box::new(CurveHandler::new(*pool, *lp_token, tokens.clone(), context)),
            PoolKind::Fraxswap { pool, tokens } => {
                Box::new(UniswapV2Handler::fraxswap(*pool, tokens.clone(), context))
            }
            PoolKind::Stablecoin { id, tokens } => {
                Box::new(StablecoinHandler::new(id.clone(), tokens.clone()))
            }
            PoolKind::CustomMapping {
                derivative,
                underlying,
            } => Box::new(CustomMappingHandler::new(*derivative, *underlying)),
        }
    }
}

/// The `network` section of the settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    pub name: String,
    /// Label stored on every token record
    pub blockchain: String,
    pub protocol_token: Address,
    #[serde(default)]
    pub staking: Option<StakingSettings>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    pub tokens: Vec<TokenInfo>,
    #[serde(default)]
    pub pools: Vec<PoolSettings>,
    #[serde(default)]
    pub supply_offsets: Vec<SupplyOffset>,
    #[serde(default)]
    pub missing_price: MissingPricePolicy,
    #[serde(default = "default_max_price_depth")]
    pub max_price_depth: u8,
}

fn default_max_price_depth() -> u8 {
    DEFAULT_MAX_DEPTH
}

/// Validated, immutable network configuration.
#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub blockchain: String,
    pub protocol_token: Address,
    pub staking: Option<StakingSettings>,
    pub wallets: Vec<Wallet>,
    pub tokens: Arc<TokenCatalog>,
    /// In handler registration order
    pub pools: Vec<PoolSettings>,
    pub supply_offsets: Vec<SupplyOffset>,
    pub missing_price: MissingPricePolicy,
    pub max_price_depth: u8,
}

impl Network {
    pub fn from_settings(settings: NetworkSettings) -> anyhow::Result<Self> {
        let tokens = TokenCatalog::new(settings.tokens);

        ensure!(
            tokens.get(settings.protocol_token).is_some(),
            "Protocol token {} is missing from the token list of {}",
            settings.protocol_token,
            settings.name
        );

        let mut ids = FxHashSet::default();
        for pool in &settings.pools {
            if !ids.insert(pool.id()) {
                bail!("Pool {} is configured twice", pool.display_name());
            }

            if let Some(token) = pool
                .priced_tokens()
                .iter()
                .find(|token| tokens.get(**token).is_none())
            {
                bail!(
                    "Pool {} holds {token}, which is missing from the token list",
                    pool.display_name()
                );
            }
        }

        Ok(Self {
            name: settings.name,
            blockchain: settings.blockchain,
            protocol_token: settings.protocol_token,
            staking: settings.staking,
            wallets: settings.wallets,
            tokens: Arc::new(tokens),
            pools: settings.pools,
            supply_offsets: settings.supply_offsets,
            missing_price: settings.missing_price,
            max_price_depth: settings.max_price_depth,
        })
    }

    /// Metadata of the protocol's own token.
    pub fn protocol_token(&self) -> Result<&TokenInfo> {
        self.tokens
            .get(self.protocol_token)
            .ok_or(Error::UnknownToken(self.protocol_token))
    }

    /// One handler per configured pool, in configuration order.
    pub fn price_handlers(&self, reader: Arc<dyn ContractReader>) -> Vec<Box<dyn PriceHandler>> {
        let context = HandlerContext::new(reader, self.tokens.clone());
        self.pools.iter().map(|pool| pool.handler(&context)).collect()
    }

    /// Resolver over this network's pools with its missing-price policy.
    pub fn resolver(&self, reader: Arc<dyn ContractReader>) -> PriceResolver {
        PriceResolver::new(self.price_handlers(reader), self.missing_price)
            .with_max_depth(self.max_price_depth)
    }

    pub fn protocol_owned_pools(&self) -> impl Iterator<Item = &PoolSettings> {
        self.pools.iter().filter(|pool| pool.protocol_owned)
    }
}
