use std::{fs, sync::Arc};

use anyhow::Context;
use jemallocator::Jemalloc;
use log::info;
use simple_logger::SimpleLogger;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use treasury_metrics::{BlockWorker, MemoryStore, Network, RpcReader, Settings};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    SimpleLogger::new()
        .with_level(settings.logging.level_filter())
        .init()
        .context("Failed to initialize logger")?;

    let network = Arc::new(
        Network::from_settings(settings.network.clone())
            .context("Invalid network configuration")?,
    );

    let reader = Arc::new(
        RpcReader::new(&settings.rpc.url).context("Failed to initialize RPC reader")?,
    );
    let block = reader.block(settings.indexer.block)?;

    let worker = BlockWorker::new(network, reader);
    let mut store = MemoryStore::new();
    let metric = worker
        .run(&block, &mut store)
        .with_context(|| format!("Failed to compute block {}", block.number))?;

    fs::write(&settings.indexer.output, store.to_json()?)
        .with_context(|| format!("Failed to write {}", settings.indexer.output))?;

    info!(
        "Wrote records for {} to {} (OHM {} / floating backing {})",
        metric.date,
        settings.indexer.output,
        metric.ohm_price.round(4),
        metric.treasury_liquid_backing_per_ohm_floating.round(4)
    );

    Ok(())
}
