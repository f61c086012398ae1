use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{json_rpc::ErrorPayload, types::TransactionRequest},
};
use anyhow::{Context, Result};
use log::debug;
use tokio::runtime::Runtime;
use url::Url;

use super::{Block, CallOutcome, ContractReader};

/// [`ContractReader`] backed by a JSON-RPC node.
///
/// The valuation pipeline is synchronous, so the reader owns a
/// current-thread runtime and blocks on each request.
pub struct RpcReader {
    provider: DynProvider,
    runtime: Runtime,
}

impl RpcReader {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build RPC runtime")?;

        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));

        Ok(Self { provider, runtime })
    }

    /// Fetch the block context for `number`, or the latest block.
    pub fn block(&self, number: Option<u64>) -> Result<Block> {
        let tag = number.map(BlockNumberOrTag::Number).unwrap_or(BlockNumberOrTag::Latest);

        let block = self
            .runtime
            .block_on(async { self.provider.get_block_by_number(tag).await })
            .with_context(|| format!("Failed to fetch block {tag}"))?
            .with_context(|| format!("Block {tag} not found"))?;

        Ok(Block::new(block.header.number, block.header.timestamp))
    }
}

impl ContractReader for RpcReader {
    fn call(&self, to: Address, calldata: Bytes, block: &Block) -> Result<CallOutcome> {
        let tx = TransactionRequest::default().with_to(to).with_input(calldata);

        let result = self.runtime.block_on(async {
            self.provider
                .call(tx)
                .block(BlockId::number(block.number))
                .await
        });

        match result {
            Ok(data) => Ok(CallOutcome::Success(data)),
            Err(e) if e.as_error_resp().is_some_and(is_revert) => {
                debug!("Call to {} reverted at block {}: {}", to, block.number, e);
                Ok(CallOutcome::Reverted)
            },
            Err(e) => Err(e).with_context(|| format!("eth_call to {to} at block {} failed", block.number)),
        }
    }
}

/// Whether an error response reports a reverted execution rather than a
/// node failure (rate limits, pruned state, unknown block).
fn is_revert(payload: &ErrorPayload) -> bool {
    payload.code == 3
        || payload.as_revert_data().is_some()
        || payload.message.to_lowercase().contains("execution reverted")
}
