//! Australian address parsing
//!
//! A deterministic rule set, no guessing: the postcode is four digits at
//! the end of the text, the state is a known abbreviation (long forms are
//! rewritten first), and the suburb is whatever of the final comma segment
//! remains once both are removed. Addresses that don't fit the rules keep
//! their raw text and are flagged for review by the caller.

use crate::model::Address;
use once_cell::sync::Lazy;
use regex::Regex;

/// State/territory abbreviations accepted as-is.
const STATES: [&str; 8] = ["NSW", "VIC", "QLD", "SA", "WA", "TAS", "NT", "ACT"];

/// Long forms rewritten to abbreviations before matching. Multi-word forms
/// come first so "Western Australia" never half-matches as "Australia".
const LONG_FORMS: [(&str, &str); 9] = [
    (r"(?i)\bwestern\s+australia\b", "WA"),
    (r"(?i)\bsouth\s+australia\b", "SA"),
    (r"(?i)\bnew\s+south\s+wales\b", "NSW"),
    (r"(?i)\bnorthern\s+territory\b", "NT"),
    (r"(?i)\baustralian\s+capital\s+territory\b", "ACT"),
    (r"(?i)\bvictoria\b", "VIC"),
    (r"(?i)\bvic\b", "VIC"),
    (r"(?i)\bqueensland\b", "QLD"),
    (r"(?i)\btasmania\b", "TAS"),
];

static POSTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})\s*$").expect("postcode regex"));

static STATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(NSW|VIC|QLD|SA|WA|TAS|NT|ACT)\b").expect("state regex"));

static LONG_FORM_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    LONG_FORMS
        .iter()
        .map(|(pattern, abbrev)| (Regex::new(pattern).expect("state long-form regex"), *abbrev))
        .collect()
});

/// Parses cleaned address text into structured components.
///
/// Components are filled only when the rules match; `Address::raw` always
/// holds the input. The caller decides what an unparsed address means
/// (needs_review, never a rejection on its own).
pub fn parse_address(raw: &str) -> Address {
    let cleaned = squeeze(raw);
    let mut address = Address {
        raw: cleaned.clone(),
        ..Address::default()
    };

    if cleaned.is_empty() {
        return address;
    }

    // Only the locality segment (after the last comma) is eligible for
    // state/postcode matching; "Victoria Rd" in a street name stays alone.
    let (street_part, locality_part) = match cleaned.rsplit_once(',') {
        Some((street, locality)) => (Some(street.trim()), locality.trim().to_string()),
        None => (None, cleaned.clone()),
    };

    let mut locality = locality_part;
    for (re, abbrev) in LONG_FORM_RES.iter() {
        locality = re.replace_all(&locality, *abbrev).into_owned();
    }

    let postcode = POSTCODE_RE
        .captures(&locality)
        .map(|caps| caps[1].to_string());
    if let Some(pc) = &postcode {
        if valid_postcode(pc) {
            address.postcode = Some(pc.clone());
        }
    }

    if let Some(m) = STATE_RE.find(&locality) {
        address.state = Some(m.as_str().to_string());

        // Suburb: the locality text before the state token.
        let suburb = locality[..m.start()].trim().trim_end_matches(',').trim();
        if !suburb.is_empty() {
            address.suburb = Some(suburb.to_string());
        }
    }

    if let Some(street) = street_part {
        if !street.is_empty() {
            address.street = Some(street.to_string());
        }
    } else if address.state.is_some() || address.postcode.is_some() {
        // Single-segment address like "1 Tip Rd Sunshine VIC 3020": treat
        // everything before the suburb/state as the street, best effort.
        if let Some(m) = STATE_RE.find(&locality) {
            let before = locality[..m.start()].trim();
            if !before.is_empty() {
                address.street = Some(before.to_string());
                address.suburb = None;
            }
        }
    }

    address
}

/// Whether the parse produced enough structure to skip manual review.
pub fn is_parsed(address: &Address) -> bool {
    address.state.is_some() && address.postcode.is_some()
}

/// Australian postcodes are four digits from 0200 upward.
pub fn valid_postcode(postcode: &str) -> bool {
    if postcode.len() != 4 || !postcode.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(postcode.parse::<u32>(), Ok(value) if (200..=9999).contains(&value))
}

/// Whether `state` is a known abbreviation.
pub fn valid_state(state: &str) -> bool {
    STATES.contains(&state)
}

fn squeeze(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_address() {
        let address = parse_address("21 Kimberley St, Darra QLD 4076");
        assert_eq!(address.street.as_deref(), Some("21 Kimberley St"));
        assert_eq!(address.suburb.as_deref(), Some("Darra"));
        assert_eq!(address.state.as_deref(), Some("QLD"));
        assert_eq!(address.postcode.as_deref(), Some("4076"));
        assert!(is_parsed(&address));
    }

    #[test]
    fn test_long_form_state_is_normalized() {
        let address = parse_address("120 Gaffney St, Coburg North Victoria 3058");
        assert_eq!(address.state.as_deref(), Some("VIC"));
        assert_eq!(address.suburb.as_deref(), Some("Coburg North"));

        let address = parse_address("12 Harvest Tce, Kewdale Western Australia 6105");
        assert_eq!(address.state.as_deref(), Some("WA"));
        assert_eq!(address.suburb.as_deref(), Some("Kewdale"));
    }

    #[test]
    fn test_vic_mixed_case() {
        let address = parse_address("8 Apex Dr, Dandenong Vic 3175");
        assert_eq!(address.state.as_deref(), Some("VIC"));
    }

    #[test]
    fn test_multiple_comma_segments() {
        let address = parse_address("Gate 2, 400 Frankston Rd, Dandenong South VIC 3175");
        assert_eq!(address.street.as_deref(), Some("Gate 2, 400 Frankston Rd"));
        assert_eq!(address.suburb.as_deref(), Some("Dandenong South"));
        assert_eq!(address.postcode.as_deref(), Some("3175"));
    }

    #[test]
    fn test_state_token_in_street_name_is_not_matched() {
        // "Victoria" in the street segment must not become the state.
        let address = parse_address("10 Victoria Rd, Parramatta NSW 2150");
        assert_eq!(address.street.as_deref(), Some("10 Victoria Rd"));
        assert_eq!(address.state.as_deref(), Some("NSW"));
    }

    #[test]
    fn test_unparseable_address_keeps_raw() {
        let address = parse_address("Lot 5 Industrial Estate");
        assert!(!is_parsed(&address));
        assert_eq!(address.raw, "Lot 5 Industrial Estate");
        assert!(address.state.is_none());
        assert!(address.postcode.is_none());
    }

    #[test]
    fn test_whitespace_is_squeezed() {
        let address = parse_address("  21   Kimberley St ,  Darra  QLD  4076 ");
        assert_eq!(address.raw, "21 Kimberley St , Darra QLD 4076");
        assert_eq!(address.postcode.as_deref(), Some("4076"));
    }

    #[test]
    fn test_single_segment_address() {
        let address = parse_address("1 Tip Rd Sunshine VIC 3020");
        assert_eq!(address.state.as_deref(), Some("VIC"));
        assert_eq!(address.postcode.as_deref(), Some("3020"));
        assert_eq!(address.street.as_deref(), Some("1 Tip Rd Sunshine"));
    }

    #[test]
    fn test_valid_postcode() {
        assert!(valid_postcode("3020"));
        assert!(valid_postcode("0200"));
        assert!(valid_postcode("9999"));
        assert!(!valid_postcode("0100"));
        assert!(!valid_postcode("302"));
        assert!(!valid_postcode("30200"));
        assert!(!valid_postcode("30a0"));
    }

    #[test]
    fn test_postcode_out_of_range_is_not_kept() {
        let address = parse_address("1 X St, Ytown NSW 0100");
        assert!(address.postcode.is_none());
        assert!(!is_parsed(&address));
    }

    #[test]
    fn test_valid_state() {
        for state in STATES {
            assert!(valid_state(state));
        }
        assert!(!valid_state("XYZ"));
    }
}
