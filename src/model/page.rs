use chrono::{DateTime, Utc};

/// What a fetched page is, for capture and coverage accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A paginated per-region listing page.
    Listing { region: String, page_no: u32 },

    /// A single location's detail page.
    Detail { region: String },
}

impl PageKind {
    /// Short tag used in the capture database.
    pub fn tag(&self) -> &'static str {
        match self {
            PageKind::Listing { .. } => "listing",
            PageKind::Detail { .. } => "detail",
        }
    }

    pub fn region(&self) -> &str {
        match self {
            PageKind::Listing { region, .. } | PageKind::Detail { region } => region,
        }
    }
}

/// One fetched unit of content. Created by the fetcher, consumed once by the
/// extractor, and buffered only so the writer can persist the raw capture.
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// The URL that was requested.
    pub url: String,

    /// The URL the response actually came from, after redirects.
    pub final_url: String,

    /// HTTP status code of the final response.
    pub status: u16,

    /// Raw response body.
    pub body: String,

    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags() {
        let listing = PageKind::Listing {
            region: "VIC".to_string(),
            page_no: 1,
        };
        let detail = PageKind::Detail {
            region: "VIC".to_string(),
        };
        assert_eq!(listing.tag(), "listing");
        assert_eq!(detail.tag(), "detail");
        assert_eq!(listing.region(), "VIC");
        assert_eq!(detail.region(), "VIC");
    }
}
