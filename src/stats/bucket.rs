//! Bucket counter records and the tally arithmetic shared by all backends

use crate::recorded::{RecordedUrl, WarcRecord};
use serde::{Deserialize, Serialize};

/// Bucket every transaction is tallied into
pub const GLOBAL_BUCKET: &str = "__all__";
/// Bucket for transactions that named no custom bucket
pub const UNSPECIFIED_BUCKET: &str = "__unspecified__";

/// A pair of counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub urls: u64,
    pub wire_bytes: u64,
}

impl Counters {
    fn add(&mut self, wire_bytes: u64) {
        self.urls += 1;
        self.wire_bytes += wire_bytes;
    }

    pub fn get(&self, field: Field) -> u64 {
        match field {
            Field::Urls => self.urls,
            Field::WireBytes => self.wire_bytes,
        }
    }
}

/// Sub-record of a bucket
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Total,
    New,
    Revisit,
}

/// Counter within a sub-record
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Urls,
    WireBytes,
}

/// Persisted counters of one bucket
///
/// Serialized as `{"bucket":..,"total":{..},"new":{..},"revisit":{..}}`.
/// After every complete tally `total == new + revisit` for both counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub bucket: String,
    pub total: Counters,
    pub new: Counters,
    pub revisit: Counters,
}

impl BucketStats {
    pub fn empty(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Count one transaction of `wire_bytes` bytes
    pub fn record(&mut self, wire_bytes: u64, revisit: bool) {
        self.total.add(wire_bytes);
        if revisit {
            self.revisit.add(wire_bytes);
        } else {
            self.new.add(wire_bytes);
        }
    }

    pub fn category(&self, category: Category) -> Counters {
        match category {
            Category::Total => self.total,
            Category::New => self.new,
            Category::Revisit => self.revisit,
        }
    }

    /// Whole record, one sub-record, or one counter
    ///
    /// A field without a category selects the whole record.
    pub fn select(&self, category: Option<Category>, field: Option<Field>) -> StatsValue {
        match (category, field) {
            (None, _) => StatsValue::Bucket(self.clone()),
            (Some(category), None) => StatsValue::Category(self.category(category)),
            (Some(category), Some(field)) => StatsValue::Counter(self.category(category).get(field)),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Result of a statistics lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatsValue {
    Bucket(BucketStats),
    Category(Counters),
    Counter(u64),
}

impl StatsValue {
    pub fn as_bucket(&self) -> Option<&BucketStats> {
        match self {
            StatsValue::Bucket(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn as_counters(&self) -> Option<Counters> {
        match self {
            StatsValue::Category(counters) => Some(*counters),
            _ => None,
        }
    }

    pub fn as_counter(&self) -> Option<u64> {
        match self {
            StatsValue::Counter(value) => Some(*value),
            _ => None,
        }
    }
}

/// Buckets a transaction is tallied into
///
/// Always the global bucket, then either the custom buckets in request
/// order (each once) or the unspecified bucket.
pub fn buckets_for(url: &RecordedUrl) -> Vec<String> {
    let mut buckets = vec![GLOBAL_BUCKET.to_string()];
    let custom = url.stats_buckets();
    if custom.is_empty() {
        buckets.push(UNSPECIFIED_BUCKET.to_string());
    } else {
        for bucket in custom {
            if !buckets.contains(bucket) {
                buckets.push(bucket.clone());
            }
        }
    }
    buckets
}

/// Whether a transaction counts as a revisit; no records counts as new
pub fn is_revisit(records: &[WarcRecord]) -> bool {
    records.first().is_some_and(WarcRecord::is_revisit)
}
