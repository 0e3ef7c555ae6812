//! Run report printing

use crate::output::manifest::RunManifest;

/// Prints a run manifest to stdout in a readable form.
pub fn print_report(manifest: &RunManifest) {
    println!("=== Wastemap Run Report ===\n");

    println!("Run: {} ({})", manifest.run_id, manifest.outcome);
    println!("  Started:  {}", manifest.started_at.to_rfc3339());
    println!("  Finished: {}", manifest.finished_at.to_rfc3339());
    println!("  Config hash: {}", manifest.config_hash);
    println!();

    let counts = &manifest.counts;
    println!("Pages:");
    println!(
        "  Listing: {} attempted, {} failed, {} zero-yield",
        counts.listing_pages_attempted, counts.listing_pages_failed, counts.zero_yield_pages
    );
    println!(
        "  Detail:  {} attempted, {} failed",
        counts.detail_pages_attempted, counts.detail_pages_failed
    );
    println!();

    println!("Records:");
    println!(
        "  {} extracted ({} extraction skips), {} validated, {} rejected",
        counts.records_extracted, counts.parse_errors, counts.records_validated,
        counts.records_rejected
    );
    if counts.id_collisions > 0 {
        println!("  {} identifier collisions merged", counts.id_collisions);
    }
    println!();

    println!("Dataset: {} locations", counts.dataset_size);
    println!(
        "  {} added, {} updated, {} unchanged, {} retained, {} purged",
        counts.added, counts.updated, counts.unchanged, counts.retained, counts.purged
    );
    println!();

    println!(
        "Coverage: {:.1}% of pages, {:.1}% of records",
        manifest.coverage.pages * 100.0,
        manifest.coverage.records * 100.0
    );
}
