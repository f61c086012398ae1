//! Contract-read capability.
//!
//! Everything the pricing engine knows about chain state comes through
//! [`ContractReader`]: an eth_call pinned to a block that either returns
//! data or reports a revert. A revert is a definitive "no data at this
//! block" (the contract did not exist yet, or is paused) and is never
//! retried.

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use anyhow::Context;

use crate::{error::Result, utils::date_key};

pub mod cache;
#[cfg(test)]
pub mod mock;
pub mod rpc;

pub use cache::CachedReader;
pub use rpc::RpcReader;

/// Block the computation is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    /// Seconds since the unix epoch
    pub timestamp: u64,
}

impl Block {
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    /// ISO date of the block, used as the daily record key.
    pub fn date(&self) -> String {
        date_key(self.timestamp)
    }
}

/// Result of a single contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(Bytes),
    Reverted,
}

/// Executes read-only contract calls at a given block.
///
/// Implementations must distinguish a revert from a successful call that
/// happens to return zero. Transport failures are errors.
pub trait ContractReader {
    fn call(&self, to: Address, calldata: Bytes, block: &Block) -> anyhow::Result<CallOutcome>;
}

/// Execute a typed call and decode its return value.
///
/// Returns `None` when the call reverted or returned no data (no code at
/// the address at this block).
pub fn read<C: SolCall>(
    reader: &dyn ContractReader,
    to: Address,
    call: &C,
    block: &Block,
) -> Result<Option<C::Return>> {
    let data = match reader.call(to, call.abi_encode().into(), block)? {
        CallOutcome::Reverted => return Ok(None),
        CallOutcome::Success(data) if data.is_empty() => return Ok(None),
        CallOutcome::Success(data) => data,
    };

    let decoded = C::abi_decode_returns(&data).with_context(|| {
        format!(
            "Failed to decode {} returned by {to} at block {}",
            C::SIGNATURE,
            block.number
        )
    })?;

    Ok(Some(decoded))
}
