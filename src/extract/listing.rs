//! Listing-page extraction
//!
//! A listing page carries a column of location cards and a pagination bar.
//! Each card yields a partial raw record (name, address, detail link); a
//! malformed card is skipped and counted without failing the page. A page
//! with no cards at all is valid — empty result pages exist — and shows up
//! in the coverage stats as a zero-yield page.

use crate::model::RawRecord;
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Everything extracted from one listing page.
#[derive(Debug, Default)]
pub struct ListingPage {
    pub records: Vec<RawRecord>,
    /// Cards skipped because their markup was missing required pieces.
    pub skipped: u64,
    pub next_url: Option<String>,
}

/// Extracts the location cards and pagination successor from a listing page.
pub fn extract_listing(body: &str, base_url: &str) -> ListingPage {
    let document = Html::parse_document(body);

    let mut page = ListingPage {
        next_url: find_next_url(&document, base_url),
        ..ListingPage::default()
    };

    let Ok(card_selector) = Selector::parse("div.white-box") else {
        return page;
    };

    for card in document.select(&card_selector) {
        match extract_card(&card, base_url) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                page.skipped += 1;
                tracing::debug!("Skipping malformed location card: {}", e);
            }
        }
    }

    page
}

/// The pagination successor of a listing page, if it has one.
pub fn next_page_url(body: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(body);
    find_next_url(&document, base_url)
}

fn find_next_url(document: &Html, base_url: &str) -> Option<String> {
    let selector = Selector::parse("li.location-pagination__next a").ok()?;
    let href = document
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let resolved = absolutize(href, base_url)?;
    // A "next" link pointing back at the page itself would loop forever
    if resolved == base_url {
        return None;
    }
    Some(resolved)
}

/// One card → one partial record. The detail link and the name are
/// required; everything else is optional.
fn extract_card(card: &ElementRef, base_url: &str) -> Result<RawRecord, ParseError> {
    let fail = |reason: &str| ParseError {
        url: base_url.to_string(),
        reason: reason.to_string(),
    };

    let link_selector = Selector::parse("a").map_err(|_| fail("bad selector"))?;
    let name_selector = Selector::parse("h2").map_err(|_| fail("bad selector"))?;
    let address_selector =
        Selector::parse("div.location-info__text").map_err(|_| fail("bad selector"))?;

    let href = card
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| fail("card has no detail link"))?;
    let detail_url =
        absolutize(href, base_url).ok_or_else(|| fail("card link is not a usable URL"))?;

    let name = card
        .select(&name_selector)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| fail("card has no name"))?;

    let address = card
        .select(&address_selector)
        .next()
        .map(element_text)
        .map(|text| text.trim_start_matches("Address:").trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(RawRecord::from_card(name, address, detail_url))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn absolutize(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/locations/?state=VIC";

    fn card(name: &str, href: &str, address: &str) -> String {
        format!(
            r#"<div class="white-box">
                <a href="{}"><h2>{}</h2></a>
                <div class="location-info__text">Address: {}</div>
            </div>"#,
            href, name, address
        )
    }

    #[test]
    fn test_extracts_cards() {
        let body = format!(
            "<html><body>{}{}</body></html>",
            card("Depot One", "/locations/depot-one/", "1 Tip Rd, Sunshine VIC 3020"),
            card("Depot Two", "/locations/depot-two/", "2 Tip Rd, Laverton VIC 3028"),
        );

        let page = extract_listing(&body, BASE);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.skipped, 0);

        let first = &page.records[0];
        assert_eq!(first.name.as_deref(), Some("Depot One"));
        assert_eq!(
            first.address.as_deref(),
            Some("1 Tip Rd, Sunshine VIC 3020")
        );
        assert_eq!(first.source_url, "https://example.com/locations/depot-one/");
    }

    #[test]
    fn test_malformed_card_does_not_take_down_the_page() {
        let body = format!(
            "<html><body>{}{}<div class=\"white-box\"><p>No link, no name</p></div>{}{}</body></html>",
            card("A", "/a/", "1 A St, Atown VIC 3000"),
            card("B", "/b/", "2 B St, Btown VIC 3001"),
            card("C", "/c/", "3 C St, Ctown VIC 3002"),
            card("D", "/d/", "4 D St, Dtown VIC 3003"),
        );

        let page = extract_listing(&body, BASE);
        assert_eq!(page.records.len(), 4);
        assert_eq!(page.skipped, 1);
    }

    #[test]
    fn test_card_without_address_is_kept() {
        let body =
            "<html><body><div class=\"white-box\"><a href=\"/x/\"><h2>X</h2></a></div></body></html>";
        let page = extract_listing(body, BASE);
        assert_eq!(page.records.len(), 1);
        assert!(page.records[0].address.is_none());
    }

    #[test]
    fn test_empty_page_yields_zero_records() {
        let page = extract_listing("<html><body><p>No results.</p></body></html>", BASE);
        assert!(page.records.is_empty());
        assert_eq!(page.skipped, 0);
        assert!(page.next_url.is_none());
    }

    #[test]
    fn test_next_link_is_absolutized() {
        let body = r#"<html><body>
            <ul><li class="location-pagination__next"><a href="?state=VIC&pg=2">Next</a></li></ul>
        </body></html>"#;
        let next = next_page_url(body, BASE);
        assert_eq!(
            next.as_deref(),
            Some("https://example.com/locations/?state=VIC&pg=2")
        );
    }

    #[test]
    fn test_self_referencing_next_link_is_dropped() {
        let body = format!(
            r#"<html><body><li class="location-pagination__next"><a href="{}">Next</a></li></body></html>"#,
            BASE
        );
        assert!(next_page_url(&body, BASE).is_none());
    }

    #[test]
    fn test_no_next_link_on_last_page() {
        let body = "<html><body><ul><li class=\"location-pagination__prev\"><a href=\"?pg=1\">Prev</a></li></ul></body></html>";
        assert!(next_page_url(body, BASE).is_none());
    }
}
