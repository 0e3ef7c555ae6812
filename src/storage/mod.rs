//! Raw capture storage
//!
//! Each run writes one SQLite capture file mapping page identifiers to the
//! raw content and raw records they produced. The capture is the audit
//! trail for the processed dataset: when a normalization rule is wrong, the
//! raw material to replay it is still there.

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::CaptureStore;
pub use traits::{CaptureSink, StorageError, StorageResult};
