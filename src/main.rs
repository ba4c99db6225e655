//! # Fargo Haps
//!
//! An event aggregation pipeline that scrapes community event listings from
//! several Fargo-Moorhead area websites, normalizes their inconsistent raw
//! data into one canonical shape, deduplicates across sources, and exports
//! the sorted collection as JSON or CSV.
//!
//! ## Usage
//!
//! ```sh
//! fargo-haps scrape --format both --output weekend-events
//! fargo-haps list --limit 25
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Scraping**: every configured source scraper runs concurrently; each
//!    source's failures stay contained at its own call site
//! 2. **Normalization**: raw records become canonical events with total
//!    dates, using per-field fallbacks
//! 3. **Aggregation**: merge, dedup by normalized identity, stable date sort
//! 4. **Export**: JSON/CSV files plus per-source debug artifacts

use std::path::Path;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod models;
mod normalize;
mod outputs;
mod page;
mod scrapers;

use aggregator::{DebugFileObserver, EventAggregator};
use cli::{Cli, Command, OutputFormat};
use models::{Event, EventSource};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Scrape { format, output } => run_scrape(format, output, &args.debug_dir).await,
        Command::List { limit } => run_list(limit, &args.debug_dir).await,
    }
}

async fn run_scrape(format: OutputFormat, output: Option<String>, debug_dir: &Path) -> Result<()> {
    let aggregator = EventAggregator::new();
    let observer = DebugFileObserver::new(debug_dir);
    let events = aggregator.aggregate(&observer).await;

    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    let base_filename =
        output.unwrap_or_else(|| format!("fargo-events-{}", Local::now().date_naive()));

    if format.wants_json() {
        let path = format!("{base_filename}.json");
        outputs::json::write_events(&events, Path::new(&path)).await?;
        println!("Events exported to {path}");
    }
    if format.wants_csv() {
        let path = format!("{base_filename}.csv");
        outputs::csv::write_events(&events, Path::new(&path)).await?;
        println!("Events exported to {path}");
    }

    print_summary(&events);
    Ok(())
}

fn print_summary(events: &[Event]) {
    println!("\nSummary:");
    println!("- Total events: {}", events.len());
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        println!(
            "- Date range: {} to {}",
            first.date.display_day(),
            last.date.display_day()
        );
    }

    let breakdown = events.iter().counts_by(|event| event.source);
    println!("- Sources:");
    for source in [
        EventSource::FargoMoorhead,
        EventSource::FargoUnderground,
        EventSource::MoorheadLibrary,
    ] {
        if let Some(count) = breakdown.get(&source) {
            println!("  - {source}: {count} events");
        }
    }
}

async fn run_list(limit: usize, debug_dir: &Path) -> Result<()> {
    let aggregator = EventAggregator::new();
    let observer = DebugFileObserver::new(debug_dir);
    let events = aggregator.aggregate(&observer).await;

    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    let shown = events.len().min(limit);
    info!(total = events.len(), shown, "Listing events");
    println!("\nUpcoming Events (showing {} of {}):\n", shown, events.len());

    for (index, event) in events.iter().take(limit).enumerate() {
        println!("{}. {}", index + 1, event.title);
        println!("   Date: {}", event.date.display_day());
        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            println!("   Location: {location}");
        }
        if let Some(category) = event.category.as_deref().filter(|c| !c.is_empty()) {
            println!("   Category: {category}");
        }
        println!("   Source: {}", event.source);
        if let Some(url) = event.url.as_deref() {
            println!("   URL: {url}");
        }
        println!();
    }

    Ok(())
}
