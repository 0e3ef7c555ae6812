//! SQLite capture store

use crate::model::{PageKind, RawRecord, SourcePage};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CaptureSink, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed capture sink for one run.
pub struct CaptureStore {
    conn: Connection,
}

impl CaptureStore {
    /// Creates the capture database for a run and stamps it with the run's
    /// start time and configuration hash.
    pub fn create(
        path: &Path,
        started_at: DateTime<Utc>,
        config_hash: &str,
    ) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        conn.execute(
            "INSERT OR REPLACE INTO run (id, started_at, config_hash) VALUES (1, ?1, ?2)",
            params![started_at.to_rfc3339(), config_hash],
        )?;

        Ok(Self { conn })
    }

    /// Creates an in-memory capture store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO run (id, started_at, config_hash) VALUES (1, ?1, ?2)",
            params![Utc::now().to_rfc3339(), "test"],
        )?;
        Ok(Self { conn })
    }
}

impl CaptureSink for CaptureStore {
    fn record_page(&mut self, page: &SourcePage, kind: &PageKind) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO pages (url, final_url, kind, region, status_code, fetched_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                page.url,
                page.final_url,
                kind.tag(),
                kind.region(),
                page.status,
                page.fetched_at.to_rfc3339(),
                page.body,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn record_raw(&mut self, record: &RawRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO raw_records
                (page_url, name, address, latitude, longitude, services, phone, email, hours)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.source_url,
                record.name,
                record.address,
                record.latitude,
                record.longitude,
                record.services,
                record.phone,
                record.email,
                record.hours,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn page_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn record_count(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM raw_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
