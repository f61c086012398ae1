//! In-memory [`ContractReader`] for tests.

use std::cell::Cell;

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use rustc_hash::FxHashMap;

use super::{Block, CallOutcome, ContractReader};

/// Answers calls from a table keyed by (contract, calldata).
///
/// Calls that were never registered revert, which is what a real node does
/// for a contract that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    responses: FxHashMap<(Address, Bytes), CallOutcome>,
    calls: Cell<usize>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the return value of `call` on `to`.
    pub fn on<C: SolCall>(&mut self, to: Address, call: C, ret: &C::Return) -> &mut Self {
        let data = Bytes::from(C::abi_encode_returns(ret));
        self.responses
            .insert((to, call.abi_encode().into()), CallOutcome::Success(data));
        self
    }

    /// Make `call` on `to` revert explicitly.
    pub fn revert<C: SolCall>(&mut self, to: Address, call: C) -> &mut Self {
        self.responses
            .insert((to, call.abi_encode().into()), CallOutcome::Reverted);
        self
    }

    /// Number of calls answered so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ContractReader for MockChain {
    fn call(&self, to: Address, calldata: Bytes, _block: &Block) -> anyhow::Result<CallOutcome> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .responses
            .get(&(to, calldata))
            .cloned()
            .unwrap_or(CallOutcome::Reverted))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, U256};

    use super::*;
    use crate::{abis::IERC20, chain::read};

    #[test]
    fn test_registered_call_decodes() {
        let token = address!("0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5");
        let wallet = address!("0x9a315bdf513367c0377fb36545857d12e85813ef");
        let mut chain = MockChain::new();
        chain.on(token, IERC20::balanceOfCall { account: wallet }, &U256::from(42u8));

        let block = Block::new(1, 0);
        let balance = read(&chain, token, &IERC20::balanceOfCall { account: wallet }, &block).unwrap();
        assert_eq!(balance, Some(U256::from(42u8)));
    }

    #[test]
    fn test_unknown_call_reverts() {
        let token = address!("0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5");
        let chain = MockChain::new();

        let block = Block::new(1, 0);
        assert_eq!(read(&chain, token, &IERC20::totalSupplyCall {}, &block).unwrap(), None);
    }

    #[test]
    fn test_explicit_revert_is_distinct_from_zero() {
        let token = address!("0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5");
        let mut chain = MockChain::new();
        chain.on(token, IERC20::totalSupplyCall {}, &U256::ZERO);

        let block = Block::new(1, 0);
        assert_eq!(
            read(&chain, token, &IERC20::totalSupplyCall {}, &block).unwrap(),
            Some(U256::ZERO)
        );

        chain.revert(token, IERC20::totalSupplyCall {});
        assert_eq!(read(&chain, token, &IERC20::totalSupplyCall {}, &block).unwrap(), None);
    }
}
