//! Capture database schema

/// SQL schema for a run's capture database
pub const SCHEMA_SQL: &str = r#"
-- One row: the run this capture belongs to
CREATE TABLE IF NOT EXISTS run (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    started_at TEXT NOT NULL,
    config_hash TEXT NOT NULL
);

-- Every page fetched this run, with its raw body
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    final_url TEXT NOT NULL,
    kind TEXT NOT NULL,
    region TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    fetched_at TEXT NOT NULL,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_url ON pages(url);
CREATE INDEX IF NOT EXISTS idx_pages_kind ON pages(kind);

-- Raw records exactly as extracted, before any normalization
CREATE TABLE IF NOT EXISTS raw_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_url TEXT NOT NULL,
    name TEXT,
    address TEXT,
    latitude TEXT,
    longitude TEXT,
    services TEXT,
    phone TEXT,
    email TEXT,
    hours TEXT
);

CREATE INDEX IF NOT EXISTS idx_raw_records_page ON raw_records(page_url);
"#;

/// Initializes the capture schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
