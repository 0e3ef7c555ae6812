//! Wastemap main entry point
//!
//! Command-line interface for the waste-services scraping pipeline.
//!
//! Exit codes signal the outcome to the orchestrator: 0 for a full run,
//! 2 for a partial run (coverage below 100% but above the abort
//! thresholds), 1 for a hard failure. A hard failure never touches the
//! previously published dataset.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wastemap::config::load_config_with_hash;
use wastemap::crawler::RunOutcome;
use wastemap::output;

/// Wastemap: a polite waste-services directory scraper
///
/// Crawls a public directory of waste-management service locations,
/// validates and normalizes what it finds, and publishes a schema-stable
/// dataset with an atomically updated current pointer.
#[derive(Parser, Debug)]
#[command(name = "wastemap")]
#[command(version)]
#[command(about = "Scrape waste-service locations into a clean dataset", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the currently published run's manifest and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Drop previously published locations the crawl no longer sees
    #[arg(long)]
    purge_missing: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.purge_missing {
        config.pipeline.purge_missing = true;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.stats {
        handle_stats(&config)?;
        return Ok(());
    }

    handle_run(config, config_hash).await
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wastemap=info,warn"),
            1 => EnvFilter::new("wastemap=debug,info"),
            2 => EnvFilter::new("wastemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validated config, shown, nothing fetched
fn handle_dry_run(config: &wastemap::Config) {
    println!("=== Wastemap Dry Run ===\n");

    println!("Pipeline:");
    println!(
        "  Politeness interval: {}ms",
        config.pipeline.politeness_interval_ms
    );
    println!("  Max attempts per URL: {}", config.pipeline.max_attempts);
    println!("  Fetch concurrency: {}", config.pipeline.fetch_concurrency);
    println!("  Max pages per seed: {}", config.pipeline.max_pages_per_seed);
    println!(
        "  Abort thresholds: {} failed-page ratio, {} rejection ratio",
        config.pipeline.max_failed_page_ratio, config.pipeline.max_rejection_ratio
    );
    println!("  Purge missing: {}", config.pipeline.purge_missing);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput root: {}", config.output.root);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {} ({})", seed.region, seed.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints the currently published run manifest
fn handle_stats(config: &wastemap::Config) -> anyhow::Result<()> {
    let root = std::path::Path::new(&config.output.root);

    let pointer = output::load_pointer(root)
        .context("failed to read current pointer")?
        .context("no dataset has been published yet")?;

    let manifest = output::load_manifest(&root.join(&pointer.manifest))
        .context("failed to read run manifest")?;

    output::print_report(&manifest);
    println!("\nDataset: {}", root.join(&pointer.dataset).display());
    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: wastemap::Config, config_hash: String) -> anyhow::Result<()> {
    match wastemap::crawler::run(config, config_hash).await {
        Ok(report) => {
            match report.outcome {
                RunOutcome::Success => {
                    tracing::info!(
                        "Run {} published {} locations",
                        report.manifest.run_id,
                        report.manifest.counts.dataset_size
                    );
                    Ok(())
                }
                RunOutcome::Partial => {
                    tracing::warn!(
                        "Run {} published with partial coverage ({:.1}% pages, {:.1}% records)",
                        report.manifest.run_id,
                        report.manifest.coverage.pages * 100.0,
                        report.manifest.coverage.records * 100.0
                    );
                    std::process::exit(2);
                }
            }
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            tracing::error!("The previously published dataset is unchanged");
            std::process::exit(1);
        }
    }
}
