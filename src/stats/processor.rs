//! Batch stage tallying every recorded url into a statistics store

use crate::config::StatsConfig;
use crate::postfetch::{Batch, BatchProcessor, PostfetchResult, PostfetchStage, UrlQueue};
use crate::recorded::RecordedUrl;
use crate::stats::distributed::{DistributedOptions, DistributedStatsStore};
use crate::stats::error::StatsResult;
use crate::stats::local::LocalStatsStore;
use crate::stats::StatsStore;
use std::sync::Arc;

/// Build the backend named by the configuration
pub fn open_stats_store(config: &StatsConfig) -> StatsResult<Box<dyn StatsStore>> {
    match config {
        StatsConfig::Local { path } => Ok(Box::new(LocalStatsStore::open(path)?)),
        StatsConfig::Distributed {
            servers,
            db,
            table,
            shards,
            replicas,
        } => {
            let options = DistributedOptions {
                db: db.clone(),
                table: table.clone(),
                shards: *shards,
                replicas: *replicas,
            };
            Ok(Box::new(DistributedStatsStore::connect(servers.as_slice(), options)?))
        }
    }
}

pub struct StatsProcessor<S: StatsStore> {
    store: S,
}

impl<S: StatsStore + 'static> StatsProcessor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Batch stage tallying into `store`
    pub fn stage(
        name: impl Into<String>,
        store: S,
        input: Arc<UrlQueue>,
        output: Option<Arc<UrlQueue>>,
    ) -> PostfetchStage<Batch<Self>> {
        PostfetchStage::new(name, Batch::new(Self::new(store), input, output))
    }
}

impl<S: StatsStore + 'static> BatchProcessor for StatsProcessor<S> {
    fn process_batch(&mut self, batch: &mut [RecordedUrl]) -> PostfetchResult<()> {
        for url in batch.iter() {
            self.store.tally(url, &url.warc_records)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.store.sync() {
            log::warn!("stats sync at shutdown failed: {}", e);
        }
        if let Err(e) = self.store.close() {
            log::warn!("closing stats store failed: {}", e);
        }
    }
}
