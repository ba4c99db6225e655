//! Source scrapers for the configured event websites.
//!
//! Each scraper follows the same shape: acquire a [`crate::page::Page`],
//! navigate to its target URL, wait for content to settle, run its own
//! selector heuristics over the rendered document, and normalize every
//! accepted raw record. The heuristics diverge per source; the contract does
//! not.
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | fargomoorhead.org | [`fargo_moorhead`] | month/day mini-calendar labels |
//! | fargounderground.com | [`fargo_underground`] | fallback URL, venue denylist |
//! | Moorhead Public Library | [`moorhead_library`] | table-row listings |

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Event, EventSource};

pub mod base;
pub mod fargo_moorhead;
pub mod fargo_underground;
pub mod moorhead_library;

/// Capability exposed per source: one `scrape()` producing canonical events.
///
/// Implementations contain their own navigation fallbacks; a scraper that
/// cannot reach its page either returns an empty list or an error that the
/// aggregator neutralizes. No scraper failure crosses the aggregation
/// boundary.
#[async_trait]
pub trait EventScraper: Send + Sync {
    fn source(&self) -> EventSource;
    fn url(&self) -> &'static str;
    async fn scrape(&self) -> Result<Vec<Event>>;
}

/// The configured scrapers, in merge-priority order: on a dedup collision
/// the event keeps the source that appears first here.
pub fn default_scrapers() -> Vec<Box<dyn EventScraper>> {
    vec![
        Box::new(fargo_moorhead::FargoMoorheadScraper),
        Box::new(fargo_underground::FargoUndergroundScraper),
        Box::new(moorhead_library::MoorheadLibraryScraper),
    ]
}
