use std::sync::Arc;

use log::info;

use crate::{
    chain::{Block, CachedReader, ContractReader},
    config::Network,
    db::{ProtocolMetric, RecordStore},
    error::Result,
    price::{HandlerContext, PriceResolver},
};

/// Computes and stores the treasury records of one network, one block at
/// a time.
///
/// Runs synchronously: every contract read blocks until the node answers,
/// and a block's records are only written once all of them were computed,
/// so a failing block leaves the store untouched.
pub struct BlockWorker {
    pub(crate) network: Arc<Network>,
    pub(crate) context: HandlerContext,
    pub(crate) resolver: PriceResolver,
}

impl BlockWorker {
    pub fn new(network: Arc<Network>, reader: Arc<dyn ContractReader>) -> Self {
        let reader: Arc<dyn ContractReader> = Arc::new(CachedReader::new(reader));
        let resolver = network.resolver(reader.clone());
        let context = HandlerContext::new(reader, network.tokens.clone());

        Self {
            network,
            context,
            resolver,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Compute every record for `block` and upsert them into `store`.
    pub fn run(&self, block: &Block, store: &mut dyn RecordStore) -> Result<ProtocolMetric> {
        info!(
            "Computing {} treasury at block {} ({})",
            self.network.name,
            block.number,
            block.date()
        );

        let mut records = self.token_records(block)?;
        records.extend(self.liquidity_records(block)?);
        let supplies = self.token_supplies(block)?;
        let metric = self.protocol_metric(block, &records, &supplies)?;

        info!(
            "Block {}: {} token records, {} supply entries, market cap {}, liquid backing {}",
            block.number,
            records.len(),
            supplies.len(),
            metric.market_cap.round(2),
            metric.treasury_liquid_backing.round(2)
        );

        for record in records {
            store.save_token_record(record)?;
        }
        for supply in supplies {
            store.save_token_supply(supply)?;
        }
        store.save_protocol_metric(metric.clone())?;

        Ok(metric)
    }
}
