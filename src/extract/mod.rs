//! Record extraction from fetched pages
//!
//! This is the only module that knows what the site's markup looks like.
//! Selectors are anchored to the semantic blocks of the page (location
//! cards, info blocks, pagination roles), not to presentational classes,
//! so a restyle is less likely to break them — and when the site does
//! change, this module is the only thing that needs revisiting.

mod detail;
mod listing;

pub use detail::extract_detail;
pub use listing::{extract_listing, next_page_url, ListingPage};
