//! # Feed Snapshots
//!
//! Pulls a fixed list of RSS and Atom feeds, merges them into one ranked view
//! of the last 24 hours, and keeps a rolling two-week history of daily
//! snapshots of that view.
//!
//! ## Features
//!
//! - Fetches every configured source concurrently; one bad source never hides
//!   the others
//! - Parses RSS 2.0 and Atom with a tolerant streaming XML reader
//! - Writes at most one automatic snapshot per UTC day, keeps 14 days
//! - Seeds an empty store from a bootstrap file (local or remote)
//! - Optionally exports a fresh bootstrap file for the next run
//!
//! ## Usage
//!
//! ```sh
//! feed_snapshots -c feeds.yaml -s data/snapshots.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Seeding**: Load the bootstrap file, seed an empty store, show its items
//! 2. **Fetching**: Download and parse every source (all at once, per-source timeout)
//! 3. **Ranking**: Drop invalid and stale items, sort newest first
//! 4. **Snapshotting**: Store today's view unless today already has one
//! 5. **Output**: Print the view, optionally save it over today or export it

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod error;
mod feeds;
mod models;
mod normalize;
mod outputs;
mod refresh;
mod seed;
mod store;
mod utils;

use cli::Cli;
use config::FeedConfig;
use feeds::transport::{HttpTransport, RetryFetch};
use models::NewsItem;
use outputs::json;
use store::{SharedStore, SnapshotFile};
use utils::{date_key, format_display_time};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_snapshots starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.store, seed_file = %args.seed_file, "Parsed CLI arguments");

    // ---- Config & transport ----
    let config = FeedConfig::load(args.config.as_deref())?.with_overrides(
        args.timeout_secs,
        args.retries,
        args.proxy_prefix.clone(),
    )?;
    info!(
        sources = config.sources.len(),
        timeout_secs = config.fetch_timeout.as_secs(),
        max_retries = config.max_retries,
        proxied = config.proxy_prefix.is_some(),
        "Configuration ready"
    );

    let http = HttpTransport::new(
        &config.user_agent,
        config.fetch_timeout,
        config.proxy_prefix.clone(),
    )?;
    let transport = RetryFetch::new(http, config.max_retries);
    let store = SharedStore::new(SnapshotFile::new(&args.store));

    // ---- Seed from bootstrap data ----
    let seed_transport = HttpTransport::new(&config.user_agent, config.fetch_timeout, None)?;
    if let Some(data) = seed::load_bootstrap(&seed_transport, &args.seed_file).await {
        match seed::seed_store(&store, &data).await {
            Ok(true) => info!("Snapshot store seeded from bootstrap data"),
            Ok(false) => debug!("Snapshot store left as is"),
            Err(e) => warn!(error = %e, "Failed to seed snapshot store"),
        }
        let initial = seed::seed_view(&data);
        if !initial.is_empty() {
            print_items("Cached news", &initial);
        }
    }

    // ---- Refresh ----
    let mut report = refresh::refresh(&transport, &config, &store).await;

    print_items("Latest news", &report.items);
    if let Some(notice) = report.failure_notice() {
        println!("{notice}");
    }
    if report.snapshot_written {
        println!("Saved today's snapshot ({} items).", report.items.len());
    }
    if let Some(e) = report.snapshot_error.take() {
        error!(path = %args.store.display(), error = %e, "Today's snapshot was not saved");
        return Err(e.into());
    }

    // ---- Manual save ----
    if args.save_now {
        match refresh::save_current_view(&store, &report.items).await? {
            Some(key) => println!("Saved current view as {key}."),
            None => println!("Nothing to save."),
        }
    }

    // ---- Export ----
    if let Some(export_dir) = &args.export_dir {
        let data = json::build_bootstrap(&report.fetched, Utc::now());
        match json::write_bootstrap(&data, export_dir).await {
            Ok(path) => println!("Wrote {}", path.display()),
            Err(e) => {
                error!(error = %e, "Failed to write bootstrap data");
                return Err(e);
            }
        }
    }

    // ---- History ----
    if args.history {
        print_history(&store).await;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

fn print_items(heading: &str, items: &[NewsItem]) {
    println!("== {heading} ({}) ==", items.len());
    if items.is_empty() {
        println!("No recent news.");
    }
    for item in items {
        println!(
            "[{}] {} | {}",
            format_display_time(item.published_at),
            item.source,
            item.title
        );
        println!("    {}", item.link);
        if !item.summary.is_empty() {
            println!("    {}", item.summary);
        }
    }
    println!();
}

async fn print_history(store: &SharedStore) {
    let snapshot = store.snapshot().await;
    let keys = snapshot.keys_newest_first();
    println!("== Snapshot history ({} days) ==", keys.len());
    for key in &keys {
        let count = snapshot.get(key).map_or(0, <[_]>::len);
        println!("{key}: {count} items");
    }

    let today = date_key(Utc::now());
    match snapshot.get(&today) {
        Some(records) => {
            println!("\n== Today's snapshot ({today}) ==");
            for record in records {
                println!("[{}] {} | {}", record.time, record.source, record.title);
                println!("    {}", record.link);
            }
        }
        None => println!("\nNo snapshot for {today} yet."),
    }
}
