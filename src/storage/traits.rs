//! Capture sink trait and error types

use crate::model::{PageKind, RawRecord, SourcePage};
use thiserror::Error;

/// Errors from the capture storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for capture storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for one run's raw capture.
///
/// The pipeline only ever appends: pages as fetched, raw records as
/// extracted. Implementations must keep the page URL usable as the join
/// key between the two.
pub trait CaptureSink {
    /// Records a fetched page with its raw body.
    fn record_page(&mut self, page: &SourcePage, kind: &PageKind) -> StorageResult<i64>;

    /// Records one extracted raw record.
    fn record_raw(&mut self, record: &RawRecord) -> StorageResult<i64>;

    /// Number of pages captured so far.
    fn page_count(&self) -> StorageResult<u64>;

    /// Number of raw records captured so far.
    fn record_count(&self) -> StorageResult<u64>;
}
