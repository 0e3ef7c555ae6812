//! Page navigation
//!
//! Enumerates the listing pages for one seed: fetch the seed URL, follow
//! the "next" pagination link the page advertises, stop when there is no
//! successor or the per-seed page cap is reached. The walk is a finite,
//! restartable-from-the-start sequence — there is no mid-sequence resume
//! across runs, and the cap guards against pagination loops on the site.
//!
//! A lost page ends the walk for its seed (the successor link lived on the
//! page we did not get); the other seeds keep going, and whether the run
//! survives is decided by the coverage threshold, not here.

use crate::config::SeedEntry;
use crate::crawler::fetcher::Fetcher;
use crate::extract;
use crate::model::{PageKind, SourcePage};
use crate::FetchError;
use std::sync::Arc;

/// Lazy pagination walk over one seed's listing pages.
pub struct SeedWalk {
    fetcher: Arc<Fetcher>,
    region: String,
    next_url: Option<String>,
    pages_emitted: u32,
    max_pages: u32,
}

impl SeedWalk {
    pub fn new(fetcher: Arc<Fetcher>, seed: &SeedEntry, max_pages: u32) -> Self {
        Self {
            fetcher,
            region: seed.region.clone(),
            next_url: Some(seed.url.clone()),
            pages_emitted: 0,
            max_pages,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Fetches the next listing page in the walk.
    ///
    /// Returns `None` when the sequence is exhausted: no successor link,
    /// the page cap was hit, or the previous page failed.
    pub async fn next_page(&mut self) -> Option<Result<(SourcePage, PageKind), FetchError>> {
        let url = self.next_url.take()?;

        if self.pages_emitted >= self.max_pages {
            tracing::warn!(
                "Region {}: page cap ({}) reached, not following further pagination",
                self.region,
                self.max_pages
            );
            return None;
        }
        self.pages_emitted += 1;

        match self.fetcher.fetch(&url).await {
            Ok(page) => {
                let next = extract::next_page_url(&page.body, &page.final_url)
                    .filter(|n| n != &url);
                self.next_url = next;

                let kind = PageKind::Listing {
                    region: self.region.clone(),
                    page_no: self.pages_emitted,
                };
                Some(Ok((page, kind)))
            }
            // The successor link was on this page; the walk ends here.
            Err(e) => Some(Err(e)),
        }
    }
}

/// Builds a walk per configured seed.
pub fn seed_walks(fetcher: &Arc<Fetcher>, seeds: &[SeedEntry], max_pages: u32) -> Vec<SeedWalk> {
    seeds
        .iter()
        .map(|seed| SeedWalk::new(Arc::clone(fetcher), seed, max_pages))
        .collect()
}

// Walk behavior over live responses (pagination chains, caps, failure
// cut-off) is exercised by the wiremock integration suite.
