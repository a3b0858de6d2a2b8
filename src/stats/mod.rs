//! Bucketed traffic statistics
//!
//! Every recorded transaction is counted into the global bucket plus either
//! the custom buckets named in its request metadata or the unspecified
//! bucket. Each bucket keeps url and wire-byte counters for all traffic,
//! for new content, and for revisits of already archived content.
//!
//! Two backends implement [`StatsStore`]: [`LocalStatsStore`] keeps the
//! counters in an embedded SQLite file owned by this process, while
//! [`DistributedStatsStore`] keeps them in a replicated document table
//! shared by several proxies.

mod bucket;
pub mod distributed;
mod error;
mod local;
mod processor;

pub use bucket::{
    buckets_for, is_revisit, BucketStats, Category, Counters, Field, StatsValue, GLOBAL_BUCKET,
    UNSPECIFIED_BUCKET,
};
pub use distributed::DistributedStatsStore;
pub use error::{StatsError, StatsResult};
pub use local::LocalStatsStore;
pub use processor::{open_stats_store, StatsProcessor};

use crate::recorded::{RecordedUrl, WarcRecord};

/// A statistics backend
pub trait StatsStore: Send + Sync {
    /// Count one transaction into each of its buckets
    ///
    /// `records` are the archival records written for `url`; the first one
    /// decides between new and revisit.
    fn tally(&self, url: &RecordedUrl, records: &[WarcRecord]) -> StatsResult<()>;

    /// Look up a bucket, or one of its sub-records or counters
    ///
    /// `None` when the bucket has never been tallied. A `field` without a
    /// `category` is ignored.
    fn value(
        &self,
        bucket: &str,
        category: Option<Category>,
        field: Option<Field>,
    ) -> StatsResult<Option<StatsValue>>;

    /// Best-effort flush to durable storage
    fn sync(&self) -> StatsResult<()>;

    /// Release resources; calling it again does nothing
    fn close(&self) -> StatsResult<()>;
}

impl<S: StatsStore + ?Sized> StatsStore for Box<S> {
    fn tally(&self, url: &RecordedUrl, records: &[WarcRecord]) -> StatsResult<()> {
        (**self).tally(url, records)
    }

    fn value(
        &self,
        bucket: &str,
        category: Option<Category>,
        field: Option<Field>,
    ) -> StatsResult<Option<StatsValue>> {
        (**self).value(bucket, category, field)
    }

    fn sync(&self) -> StatsResult<()> {
        (**self).sync()
    }

    fn close(&self) -> StatsResult<()> {
        (**self).close()
    }
}

impl<S: StatsStore + ?Sized> StatsStore for std::sync::Arc<S> {
    fn tally(&self, url: &RecordedUrl, records: &[WarcRecord]) -> StatsResult<()> {
        (**self).tally(url, records)
    }

    fn value(
        &self,
        bucket: &str,
        category: Option<Category>,
        field: Option<Field>,
    ) -> StatsResult<Option<StatsValue>> {
        (**self).value(bucket, category, field)
    }

    fn sync(&self) -> StatsResult<()> {
        (**self).sync()
    }

    fn close(&self) -> StatsResult<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests;
