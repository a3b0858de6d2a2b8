//! Common test utilities and helpers
//!
//! Transaction fixtures and an in-memory document cluster shared by the
//! integration tests.

#![allow(dead_code)]

use postfetch::recorded::{RecordedUrl, RequestMeta, WarcRecord, REVISIT};
use postfetch::stats::distributed::{DocumentCluster, TableSpec, WriteSummary};
use postfetch::stats::StatsResult;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

/// A recorded transaction with its archival records already attached
pub fn transaction(url: &str, size: u64, buckets: Option<&[&str]>, revisit: bool) -> RecordedUrl {
    let record_type = if revisit { REVISIT } else { "response" };
    let mut recorded = RecordedUrl::new(url, size).with_record(WarcRecord::of_type(record_type));
    if let Some(buckets) = buckets {
        recorded = recorded.with_meta(RequestMeta::with_buckets(buckets.iter().copied()));
    }
    recorded
}

/// The three transactions of the reference tally example
pub fn reference_transactions() -> Vec<RecordedUrl> {
    vec![
        transaction("http://example.com/1", 100, Some(&["siteA"]), false),
        transaction("http://example.com/2", 200, None, true),
        transaction("http://example.com/3", 50, Some(&["siteA"]), false),
    ]
}

/// Document cluster that keeps everything in memory
#[derive(Default)]
pub struct MemoryCluster {
    dbs: Mutex<BTreeSet<String>>,
    tables: Mutex<BTreeMap<(String, String), HashMap<String, Value>>>,
}

impl DocumentCluster for MemoryCluster {
    fn db_list(&self) -> StatsResult<Vec<String>> {
        Ok(self.dbs.lock().unwrap().iter().cloned().collect())
    }

    fn db_create(&self, db: &str) -> StatsResult<()> {
        self.dbs.lock().unwrap().insert(db.to_string());
        Ok(())
    }

    fn table_list(&self, db: &str) -> StatsResult<Vec<String>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .keys()
            .filter(|(table_db, _)| table_db == db)
            .map(|(_, table)| table.clone())
            .collect())
    }

    fn table_create(&self, db: &str, table: &str, _spec: &TableSpec) -> StatsResult<()> {
        self.tables
            .lock()
            .unwrap()
            .entry((db.to_string(), table.to_string()))
            .or_default();
        Ok(())
    }

    fn get(&self, db: &str, table: &str, key: &str) -> StatsResult<Option<Value>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&(db.to_string(), table.to_string()))
            .and_then(|rows| rows.get(key).cloned()))
    }

    fn insert_replace(&self, db: &str, table: &str, document: &Value) -> StatsResult<WriteSummary> {
        let key = document["bucket"].as_str().unwrap_or_default().to_string();
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .entry((db.to_string(), table.to_string()))
            .or_default();
        let mut summary = WriteSummary::default();
        match rows.insert(key, document.clone()) {
            Some(_) => summary.replaced = 1,
            None => summary.inserted = 1,
        }
        Ok(summary)
    }
}
