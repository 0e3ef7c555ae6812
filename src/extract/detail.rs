//! Detail-page extraction
//!
//! A location's detail page is a `location-box` with a heading and a stack
//! of info blocks (address, opening hours, services). The listing card that
//! led here acts as a fallback: if the detail page omits the name or the
//! address, the card's values are kept rather than losing the record.

use crate::model::RawRecord;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts a full raw record from a detail page, seeded from the listing
/// card that pointed at it.
pub fn extract_detail(body: &str, page_url: &str, card: &RawRecord) -> RawRecord {
    let document = Html::parse_document(body);

    let mut record = RawRecord {
        source_url: page_url.to_string(),
        ..RawRecord::default()
    };

    record.name = select_text(&document, "div.location-box h1").or_else(|| card.name.clone());

    // Info blocks: the first one is the address; the rest are recognized by
    // their title text.
    if let Ok(block_selector) = Selector::parse("div.location-box div.info-block") {
        for (index, block) in document.select(&block_selector).enumerate() {
            let title = child_text(&block, "div.info-block__title")
                .unwrap_or_default()
                .to_lowercase();

            if index == 0 || title.contains("address") {
                apply_address_block(&block, &mut record);
            } else if title.contains("service") {
                record.services = child_text(&block, "div.info-block__desc p")
                    .or_else(|| child_text(&block, "div.info-block__desc"));
            } else if title.contains("hour") {
                record.hours = child_text(&block, "div.info-block__desc p")
                    .or_else(|| child_text(&block, "div.info-block__desc"));
            }
        }
    }

    if record.address.is_none() {
        record.address = card.address.clone();
    }

    record.phone = select_scheme_link(&document, "a[href^='tel:']", "tel:");
    record.email = select_scheme_link(&document, "a[href^='mailto:']", "mailto:");

    record
}

/// Reads the address text and, when the address links to a map, the
/// coordinates embedded in the link's `q` query parameter.
fn apply_address_block(block: &ElementRef, record: &mut RawRecord) {
    let Ok(anchor_selector) = Selector::parse("p a") else {
        return;
    };

    if let Some(anchor) = block.select(&anchor_selector).next() {
        let text = element_text(anchor);
        if !text.is_empty() {
            record.address = Some(text);
        }

        if let Some(href) = anchor.value().attr("href") {
            if let Some((lat, lon)) = coordinates_from_maps_href(href) {
                record.latitude = Some(lat);
                record.longitude = Some(lon);
            }
        }
    } else if let Some(text) = child_text(block, "p") {
        record.address = Some(text);
    }
}

/// Pulls `lat, lon` text out of a maps link of the form `...?q=LAT,LON`.
fn coordinates_from_maps_href(href: &str) -> Option<(String, String)> {
    let url = Url::parse(href.trim()).ok()?;
    let q = url
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())?;
    let (lat, lon) = q.split_once(',')?;
    let (lat, lon) = (lat.trim(), lon.trim());
    if lat.is_empty() || lon.is_empty() {
        return None;
    }
    Some((lat.to_string(), lon.to_string()))
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn child_text(element: &ElementRef, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    element
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn select_scheme_link(document: &Html, selector: &str, scheme: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim_start_matches(scheme).trim().to_string())
        .filter(|value| !value.is_empty())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
