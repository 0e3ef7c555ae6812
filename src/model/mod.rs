//! Core data model for the pipeline
//!
//! Transient types (SourcePage, RawRecord) live and die inside a single run;
//! ServiceLocation is the validated entity that reaches the dataset.

mod location;
mod page;
mod raw;

pub use location::{stable_id, Address, Contact, Coordinates, ServiceCategory, ServiceLocation};
pub use page::{PageKind, SourcePage};
pub use raw::RawRecord;
