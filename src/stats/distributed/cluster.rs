//! Document store operations used by the distributed backend

use crate::stats::distributed::term;
use crate::stats::distributed::wire::{Connection, ServerAddr};
use crate::stats::error::{StatsError, StatsResult};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Layout of a table created on first use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub primary_key: String,
    pub shards: u32,
    pub replicas: u32,
}

/// Write counts reported by the store for one insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriteSummary {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub errors: u64,
    pub first_error: Option<String>,
}

impl WriteSummary {
    /// Exactly one row inserted, replaced or left unchanged, and nothing else
    pub fn is_single_row_upsert(&self) -> bool {
        self.inserted + self.replaced + self.unchanged == 1
            && self.deleted == 0
            && self.skipped == 0
            && self.errors == 0
    }
}

impl fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{inserted: {}, replaced: {}, unchanged: {}, deleted: {}, skipped: {}, errors: {}}}",
            self.inserted, self.replaced, self.unchanged, self.deleted, self.skipped, self.errors
        )?;
        if let Some(first_error) = &self.first_error {
            write!(f, " ({})", first_error)?;
        }
        Ok(())
    }
}

/// The handful of document store operations the statistics backend needs
pub trait DocumentCluster: Send + Sync {
    fn db_list(&self) -> StatsResult<Vec<String>>;

    fn db_create(&self, db: &str) -> StatsResult<()>;

    fn table_list(&self, db: &str) -> StatsResult<Vec<String>>;

    fn table_create(&self, db: &str, table: &str, spec: &TableSpec) -> StatsResult<()>;

    /// Document with primary key `key`, `None` if there is none
    fn get(&self, db: &str, table: &str, key: &str) -> StatsResult<Option<Value>>;

    /// Insert `document`, replacing whatever has the same primary key
    fn insert_replace(&self, db: &str, table: &str, document: &Value) -> StatsResult<WriteSummary>;
}

impl<C: DocumentCluster + ?Sized> DocumentCluster for Arc<C> {
    fn db_list(&self) -> StatsResult<Vec<String>> {
        (**self).db_list()
    }

    fn db_create(&self, db: &str) -> StatsResult<()> {
        (**self).db_create(db)
    }

    fn table_list(&self, db: &str) -> StatsResult<Vec<String>> {
        (**self).table_list(db)
    }

    fn table_create(&self, db: &str, table: &str, spec: &TableSpec) -> StatsResult<()> {
        (**self).table_create(db, table, spec)
    }

    fn get(&self, db: &str, table: &str, key: &str) -> StatsResult<Option<Value>> {
        (**self).get(db, table, key)
    }

    fn insert_replace(&self, db: &str, table: &str, document: &Value) -> StatsResult<WriteSummary> {
        (**self).insert_replace(db, table, document)
    }
}

/// Cluster reached over TCP, one fresh connection per operation
///
/// Each operation picks a server uniformly at random.
#[derive(Debug, Clone)]
pub struct WireCluster {
    servers: Vec<ServerAddr>,
}

impl WireCluster {
    pub fn new<S: AsRef<str>>(servers: &[S]) -> StatsResult<Self> {
        let servers = servers
            .iter()
            .map(|server| server.as_ref().parse::<ServerAddr>())
            .collect::<StatsResult<Vec<_>>>()?;
        if servers.is_empty() {
            return Err(StatsError::InvalidServer {
                address: String::new(),
                message: "at least one statistics server is required".to_string(),
            });
        }
        Ok(Self { servers })
    }

    pub fn servers(&self) -> &[ServerAddr] {
        &self.servers
    }

    fn connect(&self) -> StatsResult<Connection> {
        let server = self
            .servers
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| StatsError::protocol("no servers configured"))?;
        Connection::open(server)
    }

    fn run(&self, query: Value) -> StatsResult<Value> {
        let mut conn = self.connect()?;
        let result = conn.run(query);
        if let Err(e) = &result {
            log::debug!("query on {} failed: {}", conn.server(), e);
        }
        result
    }
}

fn string_list(value: Value) -> StatsResult<Vec<String>> {
    serde_json::from_value(value)
        .map_err(|e| StatsError::protocol(format!("expected a list of names: {}", e)))
}

impl DocumentCluster for WireCluster {
    fn db_list(&self) -> StatsResult<Vec<String>> {
        string_list(self.run(term::db_list())?)
    }

    fn db_create(&self, db: &str) -> StatsResult<()> {
        self.run(term::db_create(db)).map(|_| ())
    }

    fn table_list(&self, db: &str) -> StatsResult<Vec<String>> {
        string_list(self.run(term::table_list(db))?)
    }

    fn table_create(&self, db: &str, table: &str, spec: &TableSpec) -> StatsResult<()> {
        self.run(term::table_create(
            db,
            table,
            &spec.primary_key,
            spec.shards,
            spec.replicas,
        ))
        .map(|_| ())
    }

    fn get(&self, db: &str, table: &str, key: &str) -> StatsResult<Option<Value>> {
        match self.run(term::get(db, table, key))? {
            Value::Null => Ok(None),
            document => Ok(Some(document)),
        }
    }

    fn insert_replace(&self, db: &str, table: &str, document: &Value) -> StatsResult<WriteSummary> {
        let result = self.run(term::insert_replace(db, table, document))?;
        serde_json::from_value(result)
            .map_err(|e| StatsError::protocol(format!("malformed write summary: {}", e)))
    }
}
