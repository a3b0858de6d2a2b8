//! Distributed statistics backend

use crate::config::{DEFAULT_REPLICAS, DEFAULT_SHARDS, DEFAULT_STATS_DB, DEFAULT_STATS_TABLE};
use crate::recorded::{RecordedUrl, WarcRecord};
use crate::stats::bucket::{buckets_for, is_revisit, BucketStats, Category, Field, StatsValue};
use crate::stats::distributed::cluster::{DocumentCluster, TableSpec, WireCluster};
use crate::stats::error::{StatsError, StatsResult};
use crate::stats::StatsStore;
use serde_json::Value;

/// Primary key of the statistics table
pub const PRIMARY_KEY: &str = "bucket";

/// Where the statistics live on the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedOptions {
    pub db: String,
    pub table: String,
    pub shards: u32,
    pub replicas: u32,
}

impl Default for DistributedOptions {
    fn default() -> Self {
        Self {
            db: DEFAULT_STATS_DB.to_string(),
            table: DEFAULT_STATS_TABLE.to_string(),
            shards: DEFAULT_SHARDS,
            replicas: DEFAULT_REPLICAS,
        }
    }
}

/// Statistics shared by several proxies through a replicated table
///
/// Tallies are unconditional read-modify-write upserts: when two writers
/// update the same bucket concurrently the last write wins.
pub struct DistributedStatsStore<C: DocumentCluster = WireCluster> {
    cluster: C,
    options: DistributedOptions,
}

impl DistributedStatsStore<WireCluster> {
    /// Connect to `servers` (`host[:port]`) and make sure the table exists
    pub fn connect<S: AsRef<str>>(servers: &[S], options: DistributedOptions) -> StatsResult<Self> {
        Self::new(WireCluster::new(servers)?, options)
    }
}

impl<C: DocumentCluster> DistributedStatsStore<C> {
    pub fn new(cluster: C, options: DistributedOptions) -> StatsResult<Self> {
        let store = Self { cluster, options };
        store.ensure_db_table()?;
        Ok(store)
    }

    pub fn options(&self) -> &DistributedOptions {
        &self.options
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Create the database and table unless they already exist
    pub fn ensure_db_table(&self) -> StatsResult<()> {
        let DistributedOptions {
            db,
            table,
            shards,
            replicas,
        } = &self.options;

        if !self.cluster.db_list()?.contains(db) {
            log::info!("creating stats database {:?}", db);
            self.cluster.db_create(db)?;
        }

        if !self.cluster.table_list(db)?.contains(table) {
            log::info!("creating stats table {:?} in database {:?}", table, db);
            let spec = TableSpec {
                primary_key: PRIMARY_KEY.to_string(),
                shards: *shards,
                replicas: *replicas,
            };
            self.cluster.table_create(db, table, &spec)?;
        }
        Ok(())
    }

    fn load(&self, bucket: &str) -> StatsResult<Option<BucketStats>> {
        let document = self.cluster.get(&self.options.db, &self.options.table, bucket)?;
        log::debug!("stats lookup of bucket {} returned {:?}", bucket, document);
        document
            .map(|document| {
                serde_json::from_value(document).map_err(|source| StatsError::Serialization {
                    bucket: bucket.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn save(&self, stats: &BucketStats) -> StatsResult<()> {
        let document: Value =
            serde_json::to_value(stats).map_err(|source| StatsError::Serialization {
                bucket: stats.bucket.clone(),
                source,
            })?;
        log::debug!("saving {}", document);

        let summary =
            self.cluster
                .insert_replace(&self.options.db, &self.options.table, &document)?;
        if !summary.is_single_row_upsert() {
            return Err(StatsError::UnexpectedWrite {
                bucket: stats.bucket.clone(),
                summary: summary.to_string(),
            });
        }
        Ok(())
    }
}

impl<C: DocumentCluster> StatsStore for DistributedStatsStore<C> {
    fn tally(&self, url: &RecordedUrl, records: &[WarcRecord]) -> StatsResult<()> {
        let revisit = is_revisit(records);
        for bucket in buckets_for(url) {
            let mut stats = self
                .load(&bucket)?
                .unwrap_or_else(|| BucketStats::empty(&bucket));
            stats.record(url.size, revisit);
            self.save(&stats)?;
        }
        Ok(())
    }

    fn value(
        &self,
        bucket: &str,
        category: Option<Category>,
        field: Option<Field>,
    ) -> StatsResult<Option<StatsValue>> {
        Ok(self
            .load(bucket)?
            .map(|stats| stats.select(category, field)))
    }

    fn sync(&self) -> StatsResult<()> {
        Ok(())
    }

    fn close(&self) -> StatsResult<()> {
        Ok(())
    }
}
