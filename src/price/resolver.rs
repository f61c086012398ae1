//! Recursive USD price resolution over the configured pools.
//!
//! Handlers price a token against a peer and ask the resolver for the
//! peer's price, passing their own pool id. The resolver drops that pool
//! from the candidates for the nested lookup, which stops a two-token pool
//! from bouncing straight back to itself. Longer cycles through several
//! pools are cut off by a depth limit.
//!
//! Every lookup is memoized on (token, block, current pool, depth), which
//! fully determines its result, so each pool is asked about each peer at
//! most once per depth level instead of once per path through the graph.

use std::cell::RefCell;

use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use log::warn;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::{router::best_price, PriceHandler, PriceLookup, PriceLookupResult};
use crate::{
    chain::Block,
    error::{Error, Result},
};

/// Nested lookups allowed below a top-level request.
pub const DEFAULT_MAX_DEPTH: u8 = 10;

/// What a valuation does with a token no pool can price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPricePolicy {
    /// Value the token at zero and log a warning
    #[default]
    Zero,
    /// Abort the block's computation
    Fail,
}

impl MissingPricePolicy {
    pub fn apply(self, token: &str, block: &Block, price: Option<BigDecimal>) -> Result<BigDecimal> {
        match (price, self) {
            (Some(price), _) => Ok(price),
            (None, MissingPricePolicy::Zero) => {
                warn!("No USD price for {token} at block {}, valuing at zero", block.number);
                Ok(BigDecimal::zero())
            }
            (None, MissingPricePolicy::Fail) => Err(Error::Unresolved {
                token: token.to_string(),
                block: block.number,
            }),
        }
    }
}

/// Token, block number, current pool, depth.
type LookupKey = (Address, u64, Option<String>, u8);

/// Memoized outcome of one lookup.
#[derive(Clone)]
enum Resolved {
    Quote(Option<PriceLookupResult>),
    TooDeep { token: Address, max_depth: u8 },
}

impl Resolved {
    fn into_result(self) -> Result<Option<PriceLookupResult>> {
        match self {
            Resolved::Quote(quote) => Ok(quote),
            Resolved::TooDeep { token, max_depth } => Err(Error::MaxDepthExceeded { token, max_depth }),
        }
    }
}

/// Entry point for USD prices.
///
/// Owns the handler registry (in registration order) and memoizes lookups
/// per block.
pub struct PriceResolver {
    handlers: Vec<Box<dyn PriceHandler>>,
    policy: MissingPricePolicy,
    max_depth: u8,
    cache: RefCell<FxHashMap<LookupKey, Resolved>>,
}

impl PriceResolver {
    pub fn new(handlers: Vec<Box<dyn PriceHandler>>, policy: MissingPricePolicy) -> Self {
        Self {
            handlers,
            policy,
            max_depth: DEFAULT_MAX_DEPTH,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn handlers(&self) -> &[Box<dyn PriceHandler>] {
        &self.handlers
    }

    /// Handler registered under `id`.
    pub fn handler(&self, id: &str) -> Option<&dyn PriceHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.id() == id)
            .map(|handler| handler.as_ref())
    }

    pub fn policy(&self) -> MissingPricePolicy {
        self.policy
    }

    /// Best quote for `token`, or `None` when no pool can price it.
    pub fn price(&self, token: Address, block: &Block) -> Result<Option<PriceLookupResult>> {
        self.resolve(token, block, None, 0)
    }

    /// USD price of `token` with the missing-price policy applied.
    pub fn usd_rate(&self, token: Address, block: &Block) -> Result<BigDecimal> {
        let price = self.price(token, block)?.map(|quote| quote.price);
        self.policy.apply(&format!("{token:#x}"), block, price)
    }

    fn resolve(
        &self,
        token: Address,
        block: &Block,
        current_pool: Option<&str>,
        depth: u8,
    ) -> Result<Option<PriceLookupResult>> {
        if depth > self.max_depth {
            return Err(Error::MaxDepthExceeded {
                token,
                max_depth: self.max_depth,
            });
        }

        let key = (token, block.number, current_pool.map(str::to_string), depth);
        if let Some(resolved) = self.cache.borrow().get(&key) {
            return resolved.clone().into_result();
        }

        let candidates = self
            .handlers
            .iter()
            .map(|handler| handler.as_ref())
            .filter(|handler| Some(handler.id()) != current_pool);
        let recursion = Recursion {
            resolver: self,
            depth: depth + 1,
        };

        // Anything but a depth cut-off aborts the whole computation
        let resolved = match best_price(token, candidates, &recursion, block) {
            Ok(quote) => Resolved::Quote(quote),
            Err(Error::MaxDepthExceeded { token, max_depth }) => Resolved::TooDeep { token, max_depth },
            Err(err) => return Err(err),
        };
        self.cache.borrow_mut().insert(key, resolved.clone());

        resolved.into_result()
    }
}

impl PriceLookup for PriceResolver {
    fn lookup(
        &self,
        token: Address,
        block: &Block,
        current_pool: Option<&str>,
    ) -> Result<Option<PriceLookupResult>> {
        self.resolve(token, block, current_pool, 0)
    }
}

/// Lookup handed to handlers during resolution, one level deeper than the
/// request that created it.
struct Recursion<'a> {
    resolver: &'a PriceResolver,
    depth: u8,
}

impl PriceLookup for Recursion<'_> {
    fn lookup(
        &self,
        token: Address,
        block: &Block,
        current_pool: Option<&str>,
    ) -> Result<Option<PriceLookupResult>> {
        self.resolver.resolve(token, block, current_pool, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::address;

    use super::*;
    use crate::{
        chain::{mock::MockChain, CachedReader, ContractReader},
        price::{
            handlers::{
                pool_id,
                testing::{assert_close, catalog, dec, v2_pair, BLOCK, DAI, FRAX, OHM, USDC, WETH},
            },
            HandlerContext, StablecoinHandler, UniswapV2Handler,
        },
    };

    const OHM_DAI: Address = address!("0x055475920a8c93cffb64d039a8205f7acc7722d3");
    const OHM_WETH: Address = address!("0x69b81152c5a8d35a67b32a4d3772795d96cae4da");
    const WETH_DAI: Address = address!("0xa478c2975ab1ea89e8196811f51a7b7ade33eb11");

    fn pools() -> MockChain {
        let mut chain = MockChain::new();
        v2_pair(&mut chain, OHM_DAI, (OHM, "1000"), (DAI, "12000"));
        v2_pair(&mut chain, OHM_WETH, (OHM, "100"), (WETH, "1"));
        v2_pair(&mut chain, WETH_DAI, (WETH, "10"), (DAI, "13000"));
        chain
    }

    fn v2(chain: &Arc<MockChain>, pool: Address, tokens: [Address; 2]) -> Box<dyn PriceHandler> {
        v2_on(chain.clone(), pool, tokens)
    }

    fn v2_on(reader: Arc<dyn ContractReader>, pool: Address, tokens: [Address; 2]) -> Box<dyn PriceHandler> {
        let context = HandlerContext::new(reader, Arc::new(catalog()));
        Box::new(UniswapV2Handler::new(pool, tokens.to_vec(), context))
    }

    fn stablecoins() -> Box<dyn PriceHandler> {
        Box::new(StablecoinHandler::new("stablecoins", vec![DAI, USDC]))
    }

    const OHM_USDC: Address = address!("0x893b19c4c3b8d1f4b3c1e5e2b1a0f0d2a5c6e7f8");
    const OHM_FRAX: Address = address!("0x2dce0dda1c2f98e0f171de8333c3c6fe1bbf4877");
    const WETH_USDC: Address = address!("0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc");
    const WETH_FRAX: Address = address!("0x8d782c5806607e9aafb2ac38c1da3838edf8bd03");
    const DAI_USDC: Address = address!("0xae461ca67b15dc8dc81ce7615e0320da1a9ab8d5");

    /// Densely connected pools around OHM, WETH and three stablecoins.
    fn pool_graph() -> (MockChain, Vec<(Address, [Address; 2])>) {
        let pairs = [
            (OHM_DAI, (OHM, "1000"), (DAI, "12000")),
            (OHM_WETH, (OHM, "100"), (WETH, "1")),
            (WETH_DAI, (WETH, "10"), (DAI, "13000")),
            (OHM_USDC, (OHM, "50"), (USDC, "600")),
            (WETH_USDC, (WETH, "5"), (USDC, "6500")),
            (WETH_FRAX, (WETH, "1"), (FRAX, "1300")),
            (OHM_FRAX, (OHM, "10"), (FRAX, "120")),
            (DAI_USDC, (DAI, "1000"), (USDC, "1000")),
        ];

        let mut chain = MockChain::new();
        for (pool, token0, token1) in pairs {
            v2_pair(&mut chain, pool, token0, token1);
        }
        let pools = pairs
            .iter()
            .map(|(pool, (token0, _), (token1, _))| (*pool, [*token0, *token1]))
            .collect();

        (chain, pools)
    }

    fn graph_resolver(reader: Arc<dyn ContractReader>, pools: &[(Address, [Address; 2])]) -> PriceResolver {
        let mut handlers: Vec<Box<dyn PriceHandler>> = vec![Box::new(StablecoinHandler::new(
            "stablecoins",
            vec![DAI, USDC, FRAX],
        ))];
        handlers.extend(pools.iter().map(|(pool, tokens)| v2_on(reader.clone(), *pool, *tokens)));

        PriceResolver::new(handlers, MissingPricePolicy::Fail)
    }

    #[test]
    fn test_recurses_to_stablecoin() {
        let chain = Arc::new(pools());
        let resolver = PriceResolver::new(
            vec![stablecoins(), v2(&chain, WETH_DAI, [WETH, DAI])],
            MissingPricePolicy::Fail,
        );

        let weth = resolver.price(WETH, &BLOCK).unwrap().unwrap();
        assert_eq!(weth.price, dec("1300"));
        assert_eq!(resolver.usd_rate(DAI, &BLOCK).unwrap(), dec("1"));
    }

    #[test]
    fn test_two_hops_pick_most_liquid_route() {
        let chain = Arc::new(pools());
        let resolver = PriceResolver::new(
            vec![
                stablecoins(),
                v2(&chain, OHM_DAI, [OHM, DAI]),
                v2(&chain, OHM_WETH, [OHM, WETH]),
                v2(&chain, WETH_DAI, [WETH, DAI]),
            ],
            MissingPricePolicy::Fail,
        );

        // OHM/DAI backs 24000 of liquidity against 2600 for OHM/WETH
        let ohm = resolver.price(OHM, &BLOCK).unwrap().unwrap();
        assert_eq!(ohm.price, dec("12"));
        assert_eq!(ohm.liquidity, dec("24000"));

        let weth = resolver.price(WETH, &BLOCK).unwrap().unwrap();
        assert_eq!(weth.price, dec("1300"));
    }

    #[test]
    fn test_current_pool_is_excluded() {
        let chain = Arc::new(pools());
        let resolver = PriceResolver::new(
            vec![stablecoins(), v2(&chain, OHM_DAI, [OHM, DAI])],
            MissingPricePolicy::Fail,
        );

        let ohm_dai = pool_id(&OHM_DAI);
        assert!(resolver.lookup(OHM, &BLOCK, None).unwrap().is_some());
        assert_eq!(resolver.lookup(OHM, &BLOCK, Some(&ohm_dai)).unwrap(), None);
        assert!(resolver.handler(&ohm_dai).is_some());
    }

    #[test]
    fn test_cycle_without_anchor_hits_depth_limit() {
        let chain = Arc::new(pools());
        let resolver = PriceResolver::new(
            vec![
                v2(&chain, OHM_DAI, [OHM, DAI]),
                v2(&chain, OHM_WETH, [OHM, WETH]),
                v2(&chain, WETH_DAI, [WETH, DAI]),
            ],
            MissingPricePolicy::Zero,
        )
        .with_max_depth(4);

        let result = resolver.price(OHM, &BLOCK);
        assert!(matches!(
            result,
            Err(Error::MaxDepthExceeded { max_depth: 4, .. })
        ));
    }

    #[test]
    fn test_cycle_with_anchor_resolves() {
        let chain = Arc::new(pools());
        let resolver = PriceResolver::new(
            vec![
                v2(&chain, OHM_WETH, [OHM, WETH]),
                v2(&chain, WETH_DAI, [WETH, DAI]),
                v2(&chain, OHM_DAI, [OHM, DAI]),
                stablecoins(),
            ],
            MissingPricePolicy::Fail,
        );

        let ohm = resolver.price(OHM, &BLOCK).unwrap().unwrap();
        assert_close(&ohm.price, &dec("12"));
    }

    #[test]
    fn test_nested_lookups_are_memoized() {
        let (chain, pools) = pool_graph();
        let chain = Arc::new(chain);
        let resolver = graph_resolver(chain.clone(), &pools);

        let ohm = resolver.price(OHM, &BLOCK).unwrap().unwrap();
        assert_eq!(ohm.price, dec("12"));
        assert_eq!(ohm.liquidity, dec("24000"));

        // Walking every path down to the depth limit would take tens of
        // thousands of reads here
        assert!(chain.calls() < 2_000, "{} contract calls", chain.calls());

        let before = chain.calls();
        resolver.price(OHM, &BLOCK).unwrap();
        assert_eq!(chain.calls(), before);
    }

    #[test]
    fn test_cached_reader_reads_each_pool_once() {
        let (chain, pools) = pool_graph();
        let chain = Arc::new(chain);
        let resolver = graph_resolver(Arc::new(CachedReader::new(chain.clone())), &pools);

        let ohm = resolver.price(OHM, &BLOCK).unwrap().unwrap();
        assert_eq!(ohm.price, dec("12"));

        // token0, token1 and reserves of every pair
        assert_eq!(chain.calls(), 3 * pools.len());
    }

    #[test]
    fn test_missing_price_policies() {
        let resolver = PriceResolver::new(vec![stablecoins()], MissingPricePolicy::Zero);
        assert_eq!(resolver.price(OHM, &BLOCK).unwrap(), None);
        assert_eq!(resolver.usd_rate(OHM, &BLOCK).unwrap(), dec("0"));

        let resolver = PriceResolver::new(vec![stablecoins()], MissingPricePolicy::Fail);
        let result = resolver.usd_rate(OHM, &BLOCK);
        assert!(matches!(
            result,
            Err(Error::Unresolved { block, .. }) if block == BLOCK.number
        ));
    }

    #[test]
    fn test_no_handlers() {
        let resolver = PriceResolver::new(Vec::new(), MissingPricePolicy::Zero);

        assert_eq!(resolver.price(OHM, &BLOCK).unwrap(), None);
        assert!(resolver.handlers().is_empty());
    }

    #[test]
    fn test_policy_deserializes() {
        let policy: MissingPricePolicy = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(policy, MissingPricePolicy::Fail);
        assert_eq!(MissingPricePolicy::default(), MissingPricePolicy::Zero);
    }
}
