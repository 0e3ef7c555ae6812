//! Normalization and validation
//!
//! Turns a string-typed [`RawRecord`] into a validated [`ServiceLocation`],
//! in a fixed order: text canonicalization, address parsing, coordinate
//! parsing and range checks, service-category mapping, identifier
//! derivation. Structural failures (no name, no address) reject the record;
//! soft failures (unparseable address) keep it with `needs_review` set.

pub mod address;
pub mod categories;
pub mod hours;

use crate::model::{stable_id, Contact, Coordinates, RawRecord, ServiceLocation};
use crate::ValidationError;
use chrono::{DateTime, Utc};

/// Validates and normalizes one raw record.
pub fn normalize(
    raw: &RawRecord,
    seen_at: DateTime<Utc>,
) -> Result<ServiceLocation, ValidationError> {
    // (1) text canonicalization + structural checks
    let name = clean_required(raw.name.as_deref(), "name")?;
    let address_text = clean_required(raw.address.as_deref(), "address")?;

    // (2) address structure; failure to parse flags, never drops
    let parsed = address::parse_address(&address_text);
    let needs_review = !address::is_parsed(&parsed);

    // (3) coordinates, if the page carried any
    let coordinates = parse_coordinates(raw.latitude.as_deref(), raw.longitude.as_deref())?;

    // (4) service categories through the closed vocabulary
    let categories = categories::map_labels(raw.services.as_deref());

    // (5) stable identifier from the normalized name + address
    let id = stable_id(&name, &parsed.raw);

    let contact = Contact {
        phone: clean_optional(raw.phone.as_deref()),
        email: clean_optional(raw.email.as_deref()).map(|e| e.to_lowercase()),
    };

    let hours = raw.hours.as_deref().and_then(hours::canonicalize);

    Ok(ServiceLocation {
        id,
        name,
        address: parsed,
        coordinates,
        categories,
        contact,
        hours,
        needs_review,
        source_url: raw.source_url.clone(),
        last_seen: seen_at,
    })
}

/// Parses coordinate text, rejecting values outside valid lat/long ranges.
/// Both components must be present and parseable for coordinates to exist;
/// a lone or unparseable component degrades to no coordinates.
fn parse_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Option<Coordinates>, ValidationError> {
    let (Some(lat_text), Some(lon_text)) = (latitude, longitude) else {
        return Ok(None);
    };

    let (Ok(latitude), Ok(longitude)) = (
        lat_text.trim().parse::<f64>(),
        lon_text.trim().parse::<f64>(),
    ) else {
        return Ok(None);
    };

    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError {
            field: "latitude",
            reason: format!("{} outside [-90, 90]", latitude),
        });
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError {
            field: "longitude",
            reason: format!("{} outside [-180, 180]", longitude),
        });
    }

    Ok(Some(Coordinates {
        latitude,
        longitude,
    }))
}

fn clean_required(
    value: Option<&str>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match clean_optional(value) {
        Some(text) => Ok(text),
        None => Err(ValidationError {
            field,
            reason: "missing or empty".to_string(),
        }),
    }
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    let cleaned = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
