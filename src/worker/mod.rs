//! Valuation aggregators.
//!
//! [`BlockWorker`] computes everything for one block: treasury holdings,
//! protocol-owned liquidity, supply adjustments and the protocol metric
//! that rolls them up. Each aggregator lives in its own module as an
//! `impl BlockWorker` block.

pub mod liquidity;
pub mod metrics;
pub mod supply;
pub mod treasury;
#[allow(clippy::module_inception)]
pub mod worker;

pub use worker::BlockWorker;
