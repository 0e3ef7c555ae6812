//! The validated dataset and its merge rules
//!
//! A `Dataset` is keyed by the stable identifier, so duplicate ids are
//! unrepresentable and iteration order is the identifier order — which is
//! what makes two runs against the same site state byte-identical on disk.
//!
//! Merge rules:
//! - two *incoming* records with the same id are duplicates: merged with
//!   the later-seen non-empty field values winning, and a warning naming
//!   the collision
//! - against the previous dataset, incoming records win field-level
//!   conflicts (freshness over staleness); fields the new crawl did not see
//!   are kept from the previous record
//! - previously published locations missing from this crawl are retained
//!   unless the purge-missing policy is on (the site delists temporarily)
//! - a record that comes back unchanged keeps its previous `last_seen`, so
//!   an unchanged site produces an unchanged dataset

use crate::model::{ServiceCategory, ServiceLocation};
use std::collections::BTreeMap;

/// Ordered, identifier-unique collection of service locations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: BTreeMap<String, ServiceLocation>,
}

/// What a merge did, for the run manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub retained: u64,
    pub purged: u64,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ServiceLocation> {
        self.entries.get(id)
    }

    /// Iterates entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceLocation> {
        self.entries.values()
    }

    /// Inserts a location, replacing any entry with the same id.
    pub fn insert(&mut self, location: ServiceLocation) {
        self.entries.insert(location.id.clone(), location);
    }

    /// Builds a dataset from one run's validated records, collapsing
    /// identifier collisions. Returns the collision count.
    pub fn from_incoming(incoming: Vec<ServiceLocation>) -> (Self, u64) {
        let mut dataset = Dataset::new();
        let mut collisions = 0u64;

        for location in incoming {
            match dataset.entries.remove(&location.id) {
                None => dataset.insert(location),
                Some(existing) => {
                    collisions += 1;
                    tracing::warn!(
                        "Identifier collision on {}: '{}' ({}) and '{}' ({}), keeping freshest fields",
                        location.id,
                        existing.name,
                        existing.source_url,
                        location.name,
                        location.source_url
                    );
                    dataset.insert(merge_fields(&existing, location));
                }
            }
        }

        (dataset, collisions)
    }

    /// Merges this run's dataset over the previously published one.
    pub fn merge(previous: Dataset, incoming: Dataset, purge_missing: bool) -> (Self, MergeOutcome) {
        let mut merged = Dataset::new();
        let mut outcome = MergeOutcome::default();
        let mut previous = previous.entries;

        for (id, location) in incoming.entries {
            match previous.remove(&id) {
                None => {
                    outcome.added += 1;
                    merged.insert(location);
                }
                Some(existing) => {
                    let combined = merge_fields(&existing, location);
                    if combined.same_content(&existing) {
                        outcome.unchanged += 1;
                    } else {
                        outcome.updated += 1;
                    }
                    merged.insert(combined);
                }
            }
        }

        // Whatever the crawl no longer sees
        for (_, leftover) in previous {
            if purge_missing {
                outcome.purged += 1;
                tracing::info!("Purging {} ('{}'): not seen this run", leftover.id, leftover.name);
            } else {
                outcome.retained += 1;
                merged.insert(leftover);
            }
        }

        (merged, outcome)
    }
}

impl IntoIterator for Dataset {
    type Item = ServiceLocation;
    type IntoIter = std::collections::btree_map::IntoValues<String, ServiceLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Field-level merge: `newer` wins wherever it actually has a value;
/// `older` fills the gaps. If nothing material changed, the older record is
/// kept whole (including its `last_seen`).
fn merge_fields(older: &ServiceLocation, newer: ServiceLocation) -> ServiceLocation {
    let mut merged = newer;

    if merged.address.street.is_none() {
        merged.address.street = older.address.street.clone();
    }
    if merged.address.suburb.is_none() {
        merged.address.suburb = older.address.suburb.clone();
    }
    if merged.address.state.is_none() {
        merged.address.state = older.address.state.clone();
    }
    if merged.address.postcode.is_none() {
        merged.address.postcode = older.address.postcode.clone();
    }
    if merged.coordinates.is_none() {
        merged.coordinates = older.coordinates;
    }
    if merged.contact.phone.is_none() {
        merged.contact.phone = older.contact.phone.clone();
    }
    if merged.contact.email.is_none() {
        merged.contact.email = older.contact.email.clone();
    }
    if merged.hours.is_none() {
        merged.hours = older.hours.clone();
    }

    // An explicit Unknown means the page said nothing; real categories from
    // the previous crawl beat that.
    if merged.categories == vec![ServiceCategory::Unknown]
        && older.categories != vec![ServiceCategory::Unknown]
    {
        merged.categories = older.categories.clone();
    }

    if merged.same_content(older) {
        return older.clone();
    }
    merged
}
