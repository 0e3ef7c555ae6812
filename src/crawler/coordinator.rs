//! Pipeline coordinator
//!
//! Drives the run through its phases:
//! 1. listing walks per seed (parallel, throttled)
//! 2. detail fetches for every discovered location (parallel, throttled)
//! 3. normalization and validation
//! 4. merge with the previously published dataset
//! 5. artifact write + atomic publish
//!
//! Per-page and per-record failures are absorbed into the shared tally;
//! only the aggregate thresholds (listing coverage, rejection ratio) or a
//! run-timeout escalate to a run-level error — and any run-level error
//! happens before anything is written, so the previously published dataset
//! is never at risk.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::navigator::{seed_walks, SeedWalk};
use crate::crawler::tally::{self, RunTally, SharedTally};
use crate::crawler::throttle::{effective_interval, Throttle};
use crate::dataset::Dataset;
use crate::extract;
use crate::model::{PageKind, RawRecord, SourcePage};
use crate::normalize;
use crate::output::{self, ManifestCounts, ManifestCoverage, RunManifest};
use crate::robots::RobotsCache;
use crate::WastemapError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Full coverage: every page fetched, every record validated.
    Success,

    /// Coverage below 100% but above the abort thresholds.
    Partial,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Success => "success",
            RunOutcome::Partial => "partial",
        }
    }
}

/// The result of a completed (published) run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub manifest: RunManifest,
}

/// What one seed's listing walk produced.
#[derive(Default)]
struct SeedHarvest {
    pages: Vec<(SourcePage, PageKind)>,
    /// (region, card record) pairs.
    cards: Vec<(String, RawRecord)>,
}

/// Runs the whole pipeline and publishes the dataset.
pub async fn run_pipeline(config: Config, config_hash: String) -> crate::Result<RunReport> {
    if config.seeds.is_empty() {
        return Err(crate::ConfigError::Validation(
            "at least one [[seed]] entry is required".to_string(),
        )
        .into());
    }

    let started_at = Utc::now();
    let started = Instant::now();
    let deadline = config
        .pipeline
        .run_timeout_secs
        .map(|secs| started + Duration::from_secs(secs));
    let run_id = started_at.format("%Y%m%dT%H%M%S%.3fZ").to_string();

    tracing::info!(
        "Starting run {} ({} seeds, concurrency {})",
        run_id,
        config.seeds.len(),
        config.pipeline.fetch_concurrency
    );

    let client = build_http_client(
        &config.user_agent,
        Duration::from_millis(config.pipeline.request_timeout_ms),
    )?;
    let robots = RobotsCache::new(config.user_agent.header_value());

    // The politeness interval honors the site's Crawl-delay when larger.
    let crawl_delay = match Url::parse(&config.seeds[0].url) {
        Ok(url) => robots.crawl_delay(&client, &url).await,
        Err(_) => None,
    };
    let interval = effective_interval(config.pipeline.politeness_interval_ms, crawl_delay);
    if interval > Duration::from_millis(config.pipeline.politeness_interval_ms) {
        tracing::info!("robots.txt Crawl-delay raises politeness interval to {:?}", interval);
    }

    let throttle = Throttle::new(config.pipeline.fetch_concurrency as usize, interval);
    let fetcher = Arc::new(Fetcher::new(client, throttle, robots, &config.pipeline));
    let tally = tally::shared();

    // Phase 1: listing walks
    let (mut pages, cards) = walk_all_seeds(&config, &fetcher, &tally, deadline).await;
    check_deadline(deadline, &config)?;
    {
        let t = tally.lock().unwrap();
        t.check_listing_coverage(config.pipeline.max_failed_page_ratio)?;
        if t.listing_pages_attempted > 0 && t.listing_pages_failed == t.listing_pages_attempted {
            return Err(WastemapError::AllSeedsFailed);
        }
        tracing::info!(
            "Listing phase: {} pages, {} failed, {} cards",
            t.listing_pages_attempted,
            t.listing_pages_failed,
            cards.len()
        );
    }

    // Phase 2: detail fetches
    let (detail_pages, raw_records) = fetch_details(cards, &fetcher, &tally, deadline).await;
    pages.extend(detail_pages);
    check_deadline(deadline, &config)?;

    // Phase 3: normalize + validate
    let mut validated = Vec::new();
    for raw in &raw_records {
        match normalize::normalize(raw, started_at) {
            Ok(location) => {
                validated.push(location);
                tally.lock().unwrap().records_validated += 1;
            }
            Err(e) => {
                tracing::debug!("Rejected record from {}: {}", raw.source_url, e);
                tally.lock().unwrap().records_rejected += 1;
            }
        }
    }
    tally
        .lock()
        .unwrap()
        .check_rejections(config.pipeline.max_rejection_ratio)?;

    // Phase 4: merge with the previously published dataset
    check_deadline(deadline, &config)?;
    let root = Path::new(&config.output.root);
    let (previous, _) = output::load_current_dataset(root)?;

    let (incoming, collisions) = Dataset::from_incoming(validated);
    tally.lock().unwrap().id_collisions = collisions;
    let (dataset, merge_outcome) =
        Dataset::merge(previous, incoming, config.pipeline.purge_missing);

    // Phase 5: write + publish
    let snapshot = tally.lock().unwrap().clone();
    let outcome = if snapshot.is_complete() {
        RunOutcome::Success
    } else {
        RunOutcome::Partial
    };
    let manifest = build_manifest(
        run_id,
        config_hash,
        outcome,
        started_at,
        &snapshot,
        dataset.len() as u64,
        merge_outcome,
    );
    output::publish_run(root, &manifest, &pages, &raw_records, &dataset)?;

    tracing::info!(
        "Run {} finished in {:?}: {} fetched, {} extracted, {} validated, {} rejected, coverage {:.1}%",
        manifest.run_id,
        started.elapsed(),
        snapshot.listing_pages_attempted + snapshot.detail_pages_attempted,
        snapshot.records_extracted,
        snapshot.records_validated,
        snapshot.records_rejected,
        manifest.coverage.pages * 100.0
    );

    Ok(RunReport { outcome, manifest })
}

/// Runs every seed's listing walk on the worker pool and gathers the
/// harvest.
async fn walk_all_seeds(
    config: &Config,
    fetcher: &Arc<Fetcher>,
    tally: &SharedTally,
    deadline: Option<Instant>,
) -> (Vec<(SourcePage, PageKind)>, Vec<(String, RawRecord)>) {
    let mut join_set = JoinSet::new();
    for walk in seed_walks(fetcher, &config.seeds, config.pipeline.max_pages_per_seed) {
        let tally = Arc::clone(tally);
        join_set.spawn(walk_seed(walk, tally, deadline));
    }

    let mut pages = Vec::new();
    let mut cards = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(harvest) => {
                pages.extend(harvest.pages);
                cards.extend(harvest.cards);
            }
            Err(e) => tracing::error!("Listing task failed: {}", e),
        }
    }
    (pages, cards)
}

/// One seed's walk: fetch pages until the sequence ends, extracting cards
/// as pages arrive.
async fn walk_seed(mut walk: SeedWalk, tally: SharedTally, deadline: Option<Instant>) -> SeedHarvest {
    let mut harvest = SeedHarvest::default();

    loop {
        if past_deadline(deadline) {
            tracing::warn!("Region {}: stopping walk at run timeout", walk.region());
            break;
        }

        let Some(result) = walk.next_page().await else {
            break;
        };
        tally.lock().unwrap().listing_pages_attempted += 1;

        match result {
            Ok((page, kind)) => {
                let listing = extract::extract_listing(&page.body, &page.final_url);
                {
                    let mut t = tally.lock().unwrap();
                    t.records_extracted += listing.records.len() as u64;
                    t.parse_errors += listing.skipped;
                    if listing.records.is_empty() {
                        t.zero_yield_pages += 1;
                    }
                }

                let region = walk.region().to_string();
                harvest
                    .cards
                    .extend(listing.records.into_iter().map(|r| (region.clone(), r)));
                harvest.pages.push((page, kind));
            }
            Err(e) => {
                tracing::warn!("Region {}: listing page lost: {}", walk.region(), e);
                tally.lock().unwrap().listing_pages_failed += 1;
            }
        }
    }

    harvest
}

/// Fetches every discovered detail page on the worker pool. A failed detail
/// fetch keeps the listing-card record rather than losing the location.
async fn fetch_details(
    cards: Vec<(String, RawRecord)>,
    fetcher: &Arc<Fetcher>,
    tally: &SharedTally,
    deadline: Option<Instant>,
) -> (Vec<(SourcePage, PageKind)>, Vec<RawRecord>) {
    // One fetch per distinct detail URL, in a stable order.
    let mut targets: BTreeMap<String, (String, RawRecord)> = BTreeMap::new();
    for (region, card) in cards {
        targets
            .entry(card.source_url.clone())
            .or_insert((region, card));
    }

    let mut join_set = JoinSet::new();
    for (_, (region, card)) in targets {
        let fetcher = Arc::clone(fetcher);
        let tally = Arc::clone(tally);
        join_set.spawn(fetch_detail(fetcher, tally, region, card, deadline));
    }

    let mut pages = Vec::new();
    let mut records = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok((page, record)) => {
                if let Some(page) = page {
                    pages.push(page);
                }
                records.push(record);
            }
            Err(e) => tracing::error!("Detail task failed: {}", e),
        }
    }
    (pages, records)
}

async fn fetch_detail(
    fetcher: Arc<Fetcher>,
    tally: SharedTally,
    region: String,
    card: RawRecord,
    deadline: Option<Instant>,
) -> (Option<(SourcePage, PageKind)>, RawRecord) {
    if past_deadline(deadline) {
        return (None, card);
    }

    tally.lock().unwrap().detail_pages_attempted += 1;
    let url = card.source_url.clone();

    match fetcher.fetch(&url).await {
        Ok(page) => {
            let record = extract::extract_detail(&page.body, &page.final_url, &card);
            let kind = PageKind::Detail { region };
            (Some((page, kind)), record)
        }
        Err(e) => {
            tracing::warn!("Detail page lost, keeping listing-card data: {}", e);
            tally.lock().unwrap().detail_pages_failed += 1;
            (None, card)
        }
    }
}

fn build_manifest(
    run_id: String,
    config_hash: String,
    outcome: RunOutcome,
    started_at: chrono::DateTime<Utc>,
    tally: &RunTally,
    dataset_size: u64,
    merge: crate::dataset::MergeOutcome,
) -> RunManifest {
    RunManifest {
        run_id,
        config_hash,
        outcome: outcome.as_str().to_string(),
        started_at,
        finished_at: Utc::now(),
        counts: ManifestCounts {
            listing_pages_attempted: tally.listing_pages_attempted,
            listing_pages_failed: tally.listing_pages_failed,
            zero_yield_pages: tally.zero_yield_pages,
            detail_pages_attempted: tally.detail_pages_attempted,
            detail_pages_failed: tally.detail_pages_failed,
            records_extracted: tally.records_extracted,
            parse_errors: tally.parse_errors,
            records_validated: tally.records_validated,
            records_rejected: tally.records_rejected,
            id_collisions: tally.id_collisions,
            dataset_size,
            added: merge.added,
            updated: merge.updated,
            unchanged: merge.unchanged,
            retained: merge.retained,
            purged: merge.purged,
        },
        coverage: ManifestCoverage {
            pages: tally.page_coverage(),
            records: tally.record_coverage(),
        },
    }
}

fn past_deadline(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn check_deadline(deadline: Option<Instant>, config: &Config) -> crate::Result<()> {
    if past_deadline(deadline) {
        return Err(WastemapError::RunTimeout {
            budget_secs: config.pipeline.run_timeout_secs.unwrap_or(0),
        });
    }
    Ok(())
}
