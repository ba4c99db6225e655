//! Fan-out aggregation across all configured source scrapers.
//!
//! All scrapers run concurrently; each call site catches its own failure and
//! substitutes an empty list, so one unreachable site never affects another
//! source or the overall run. After the full join the merged set is
//! deduplicated by a normalized `(title, calendar day, location)` key and
//! stably sorted by date, keeping export output deterministic for identical
//! input.
//!
//! Debug-file side effects are isolated behind the [`ScrapeObserver`]
//! callback so the aggregation itself stays a pure function of scraper
//! outputs.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use itertools::Itertools;
use tracing::{error, info, instrument, warn};

use crate::models::{Event, EventSource};
use crate::outputs::json;
use crate::scrapers::{EventScraper, default_scrapers};

/// Observer invoked after each source finishes successfully, with that
/// source's raw (pre-dedup) event list. Observer failures never reach the
/// aggregate.
#[async_trait]
pub trait ScrapeObserver: Send + Sync {
    async fn source_completed(&self, source: EventSource, events: &[Event]);
}

/// Observer that does nothing; used by `list`-style callers and tests.
pub struct NullObserver;

#[async_trait]
impl ScrapeObserver for NullObserver {
    async fn source_completed(&self, _source: EventSource, _events: &[Event]) {}
}

/// Writes one JSON debug file per source per calendar day.
pub struct DebugFileObserver {
    dir: PathBuf,
}

impl DebugFileObserver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ScrapeObserver for DebugFileObserver {
    async fn source_completed(&self, source: EventSource, events: &[Event]) {
        let filename = format!("debug-{}-{}.json", source.slug(), Utc::now().date_naive());
        let path = self.dir.join(filename);
        match json::write_events(events, &path).await {
            Ok(()) => info!(path = %path.display(), "Debug file saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write debug file"),
        }
    }
}

pub struct EventAggregator {
    scrapers: Vec<Box<dyn EventScraper>>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self {
            scrapers: default_scrapers(),
        }
    }

    /// Override the scraper set; scraper order decides which source wins a
    /// dedup collision.
    pub fn with_scrapers(scrapers: Vec<Box<dyn EventScraper>>) -> Self {
        Self { scrapers }
    }

    /// Run every scraper concurrently, merge, dedup, and sort. Never fails
    /// as a whole; an aggregate of zero events is a valid result.
    #[instrument(level = "info", skip_all)]
    pub async fn aggregate(&self, observer: &dyn ScrapeObserver) -> Vec<Event> {
        info!("Starting event aggregation");

        let tasks = self.scrapers.iter().map(|scraper| async move {
            let source = scraper.source();
            info!(%source, url = scraper.url(), "Scraping");
            match scraper.scrape().await {
                Ok(events) => {
                    info!(%source, count = events.len(), "Source finished");
                    observer.source_completed(source, &events).await;
                    events
                }
                Err(e) => {
                    error!(%source, error = %e, "Scrape failed; continuing without this source");
                    Vec::new()
                }
            }
        });

        // Full fan-out/fan-in: every scraper finishes (or fails) before the
        // merge proceeds.
        let merged: Vec<Event> = join_all(tasks).await.into_iter().flatten().collect();

        let mut events = deduplicate(merged);
        sort_by_date(&mut events);
        info!(total = events.len(), "Total events aggregated");
        events
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse duplicate listings across sources; the first occurrence in merge
/// order keeps its attribution.
pub fn deduplicate(events: Vec<Event>) -> Vec<Event> {
    events.into_iter().unique_by(event_key).collect()
}

/// Stable ascending sort by date; events sharing a timestamp keep their
/// relative order across runs.
pub fn sort_by_date(events: &mut [Event]) {
    events.sort_by_key(|event| event.date.sort_key());
}

/// Identity key for deduplication: normalized title, calendar day (or the
/// `invalid-date` literal), normalized location.
pub fn event_key(event: &Event) -> String {
    format!(
        "{}-{}-{}",
        normalize_key_part(&event.title),
        event.date.day_key(),
        normalize_key_part(event.location.as_deref().unwrap_or(""))
    )
}

fn normalize_key_part(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}
