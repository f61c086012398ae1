//! Per-block memoization of contract reads.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use moka::sync::Cache;

use super::{Block, CallOutcome, ContractReader};

/// Entries kept before the least recently used calls are evicted.
const MAX_CACHED_CALLS: u64 = 100_000;

/// [`ContractReader`] that answers repeated calls from memory.
///
/// Chain state at a fixed block never changes, so a call is only sent once
/// per (contract, calldata, block). Reverts are cached, errors are not.
pub struct CachedReader {
    inner: Arc<dyn ContractReader>,
    calls: Cache<(Address, Bytes, u64), CallOutcome>,
}

impl CachedReader {
    pub fn new(inner: Arc<dyn ContractReader>) -> Self {
        let calls = Cache::builder().max_capacity(MAX_CACHED_CALLS).build();

        Self { inner, calls }
    }
}

impl ContractReader for CachedReader {
    fn call(&self, to: Address, calldata: Bytes, block: &Block) -> anyhow::Result<CallOutcome> {
        let key = (to, calldata, block.number);
        if let Some(outcome) = self.calls.get(&key) {
            return Ok(outcome);
        }

        let outcome = self.inner.call(to, key.1.clone(), block)?;
        self.calls.insert(key, outcome.clone());

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, U256},
        sol_types::SolCall,
    };

    use super::*;
    use crate::{
        abis::IERC20,
        chain::{mock::MockChain, read},
    };

    const TOKEN: Address = address!("0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5");

    struct Failing;

    impl ContractReader for Failing {
        fn call(&self, _to: Address, _calldata: Bytes, _block: &Block) -> anyhow::Result<CallOutcome> {
            Err(anyhow::anyhow!("connection reset"))
        }
    }

    #[test]
    fn test_repeated_calls_hit_the_node_once_per_block() {
        let mut chain = MockChain::new();
        chain.on(TOKEN, IERC20::totalSupplyCall {}, &U256::from(7u8));
        let chain = Arc::new(chain);
        let reader = CachedReader::new(chain.clone());

        let block = Block::new(1, 0);
        for _ in 0..3 {
            let supply = read(&reader, TOKEN, &IERC20::totalSupplyCall {}, &block).unwrap();
            assert_eq!(supply, Some(U256::from(7u8)));
        }
        // Reverts are answers too
        for _ in 0..2 {
            let decimals = read(&reader, TOKEN, &IERC20::decimalsCall {}, &block).unwrap();
            assert_eq!(decimals, None);
        }
        assert_eq!(chain.calls(), 2);

        read(&reader, TOKEN, &IERC20::totalSupplyCall {}, &Block::new(2, 12)).unwrap();
        assert_eq!(chain.calls(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let reader = CachedReader::new(Arc::new(Failing));
        let calldata = Bytes::from(IERC20::totalSupplyCall {}.abi_encode());
        let block = Block::new(1, 0);

        assert!(reader.call(TOKEN, calldata.clone(), &block).is_err());
        assert!(reader.call(TOKEN, calldata, &block).is_err());
        assert_eq!(reader.calls.entry_count(), 0);
    }
}
