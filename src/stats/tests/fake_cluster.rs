//! In-memory document cluster

use crate::stats::distributed::{DocumentCluster, TableSpec, WriteSummary};
use crate::stats::{StatsError, StatsResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeCluster {
    dbs: Mutex<BTreeMap<String, BTreeMap<String, HashMap<String, Value>>>>,
    pub table_specs: Mutex<Vec<TableSpec>>,
    pub db_creates: Mutex<usize>,
    pub table_creates: Mutex<usize>,
    /// Summary reported by inserts instead of the real one
    pub forced_summary: Mutex<Option<WriteSummary>>,
}

impl FakeCluster {
    pub fn document(&self, db: &str, table: &str, key: &str) -> Option<Value> {
        self.dbs
            .lock()
            .unwrap()
            .get(db)
            .and_then(|tables| tables.get(table))
            .and_then(|rows| rows.get(key))
            .cloned()
    }

    pub fn table_count(&self, db: &str) -> usize {
        self.dbs.lock().unwrap().get(db).map_or(0, |tables| tables.len())
    }
}

impl DocumentCluster for FakeCluster {
    fn db_list(&self) -> StatsResult<Vec<String>> {
        Ok(self.dbs.lock().unwrap().keys().cloned().collect())
    }

    fn db_create(&self, db: &str) -> StatsResult<()> {
        *self.db_creates.lock().unwrap() += 1;
        let mut dbs = self.dbs.lock().unwrap();
        if dbs.contains_key(db) {
            return Err(StatsError::Remote {
                kind: "runtime error".to_string(),
                message: format!("Database `{}` already exists.", db),
            });
        }
        dbs.insert(db.to_string(), BTreeMap::new());
        Ok(())
    }

    fn table_list(&self, db: &str) -> StatsResult<Vec<String>> {
        let dbs = self.dbs.lock().unwrap();
        let tables = dbs.get(db).ok_or_else(|| StatsError::Remote {
            kind: "runtime error".to_string(),
            message: format!("Database `{}` does not exist.", db),
        })?;
        Ok(tables.keys().cloned().collect())
    }

    fn table_create(&self, db: &str, table: &str, spec: &TableSpec) -> StatsResult<()> {
        *self.table_creates.lock().unwrap() += 1;
        self.table_specs.lock().unwrap().push(spec.clone());
        let mut dbs = self.dbs.lock().unwrap();
        let tables = dbs.get_mut(db).ok_or_else(|| StatsError::Remote {
            kind: "runtime error".to_string(),
            message: format!("Database `{}` does not exist.", db),
        })?;
        if tables.contains_key(table) {
            return Err(StatsError::Remote {
                kind: "runtime error".to_string(),
                message: format!("Table `{}.{}` already exists.", db, table),
            });
        }
        tables.insert(table.to_string(), HashMap::new());
        Ok(())
    }

    fn get(&self, db: &str, table: &str, key: &str) -> StatsResult<Option<Value>> {
        Ok(self.document(db, table, key))
    }

    fn insert_replace(&self, db: &str, table: &str, document: &Value) -> StatsResult<WriteSummary> {
        if let Some(summary) = self.forced_summary.lock().unwrap().clone() {
            return Ok(summary);
        }

        let key = document["bucket"].as_str().unwrap_or_default().to_string();
        let mut dbs = self.dbs.lock().unwrap();
        let rows = dbs
            .get_mut(db)
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| StatsError::Remote {
                kind: "runtime error".to_string(),
                message: format!("Table `{}.{}` does not exist.", db, table),
            })?;

        let mut summary = WriteSummary::default();
        match rows.insert(key, document.clone()) {
            None => summary.inserted = 1,
            Some(previous) if &previous == document => summary.unchanged = 1,
            Some(_) => summary.replaced = 1,
        }
        Ok(summary)
    }
}
