//! Local statistics backend on an embedded SQLite file

use crate::core::sync::handle_mutex_poison;
use crate::recorded::{RecordedUrl, WarcRecord};
use crate::stats::bucket::{buckets_for, is_revisit, BucketStats, Category, Field, StatsValue};
use crate::stats::error::{StatsError, StatsResult};
use crate::stats::StatsStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS buckets (
    bucket TEXT PRIMARY KEY,
    stats TEXT NOT NULL
) WITHOUT ROWID;";

/// Statistics kept in a single-process SQLite database
///
/// All threads share one connection; each tally is one transaction.
pub struct LocalStatsStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl LocalStatsStore {
    /// Open `path`, creating the database if it does not exist
    pub fn open(path: impl AsRef<Path>) -> StatsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            log::info!("opening existing stats database {}", path.display());
        } else {
            log::info!("creating new stats database {}", path.display());
        }

        let conn = Connection::open(&path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StatsResult<MutexGuard<'_, Option<Connection>>> {
        handle_mutex_poison(self.conn.lock(), |message| StatsError::Poisoned { message })
    }

    /// All bucket names currently stored, sorted
    pub fn bucket_names(&self) -> StatsResult<Vec<String>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StatsError::Closed)?;
        let mut stmt = conn.prepare("SELECT bucket FROM buckets ORDER BY bucket")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn load(conn: &Connection, bucket: &str) -> StatsResult<Option<BucketStats>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT stats FROM buckets WHERE bucket = ?1",
            params![bucket],
            |row| row.get(0),
        )
        .optional()?;

    json.map(|json| {
        BucketStats::from_json(&json).map_err(|source| StatsError::Serialization {
            bucket: bucket.to_string(),
            source,
        })
    })
    .transpose()
}

impl StatsStore for LocalStatsStore {
    fn tally(&self, url: &RecordedUrl, records: &[WarcRecord]) -> StatsResult<()> {
        let revisit = is_revisit(records);
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(StatsError::Closed)?;

        let tx = conn.transaction()?;
        for bucket in buckets_for(url) {
            let mut stats = load(&tx, &bucket)?.unwrap_or_else(|| BucketStats::empty(&bucket));
            stats.record(url.size, revisit);
            let json = stats.to_json().map_err(|source| StatsError::Serialization {
                bucket: bucket.clone(),
                source,
            })?;
            tx.execute(
                "INSERT OR REPLACE INTO buckets (bucket, stats) VALUES (?1, ?2)",
                params![bucket, json],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn value(
        &self,
        bucket: &str,
        category: Option<Category>,
        field: Option<Field>,
    ) -> StatsResult<Option<StatsValue>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StatsError::Closed)?;
        Ok(load(conn, bucket)?.map(|stats| stats.select(category, field)))
    }

    fn sync(&self) -> StatsResult<()> {
        let guard = self.lock()?;
        if let Some(conn) = guard.as_ref() {
            if let Err(e) = conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(())) {
                log::debug!("ignoring stats database sync failure: {}", e);
            }
        }
        Ok(())
    }

    fn close(&self) -> StatsResult<()> {
        let mut guard = self.lock()?;
        if let Some(conn) = guard.take() {
            log::debug!("closing stats database {}", self.path.display());
            conn.close().map_err(|(_, e)| StatsError::from(e))?;
        }
        Ok(())
    }
}
