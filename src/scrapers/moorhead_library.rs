//! Moorhead Public Library program scraper.
//!
//! The library calendar serves programs either as styled listing blocks or as
//! bare table rows, so every heuristic here has a table-row fallback: first
//! cell for the title, second cell for the description, and a scan across
//! cells for anything date-shaped. Records default to the library itself as
//! the location and are categorized as library programs.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};

use super::{EventScraper, base};
use crate::models::{Event, EventSource, RawRecord};
use crate::normalize::normalize;
use crate::page::Page;

const URL: &str = "https://larl.libnet.info/events?n=3&l=Moorhead+Public+Library&r=months";
const ORIGIN: &str = "https://larl.libnet.info";

const SELECTOR_WAIT: Duration = Duration::from_secs(10);
const DEFAULT_LOCATION: &str = "Moorhead Public Library";
const CATEGORY: &str = "Library Program";

const WAIT_SELECTOR: &str = r#".event, .program, .listing, [class*="event"], [class*="program"]"#;

static ELEMENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".event, .program, .listing, .item, [class*="event"], [class*="program"], tr"#)
        .expect("library elements")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"h2, h3, h4, .title, .event-title, .program-title, [class*="title"], a"#)
        .expect("library title")
});
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".description, .content, .excerpt, p, [class*="description"]"#)
        .expect("library description")
});
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".date, .event-date, time, [class*="date"]"#).expect("library date")
});
static LOCATION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".location, .venue, [class*="location"]"#).expect("library location")
});
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("library link"));
static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("library image"));
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("library cell"));

static CELL_DATE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2}|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec")
        .expect("valid cell date hint")
});

pub struct MoorheadLibraryScraper;

#[async_trait]
impl EventScraper for MoorheadLibraryScraper {
    fn source(&self) -> EventSource {
        EventSource::MoorheadLibrary
    }

    fn url(&self) -> &'static str {
        URL
    }

    #[instrument(level = "info", skip_all)]
    async fn scrape(&self) -> Result<Vec<Event>> {
        let mut page = Page::new()?;
        page.goto(URL).await?;

        if !page.wait_for_selector(WAIT_SELECTOR, SELECTOR_WAIT).await {
            warn!("No events found on Moorhead Library page");
            return Ok(Vec::new());
        }

        let records = {
            let document = page.document();
            extract_records(&document)
        };
        info!(count = records.len(), "Moorhead Library records extracted");

        Ok(records
            .into_iter()
            .map(|record| normalize(record, self.source()))
            .collect())
    }
}

fn is_table_row(element: &ElementRef<'_>) -> bool {
    element.value().name().eq_ignore_ascii_case("tr")
}

fn cell_text(element: &ElementRef<'_>, index: usize) -> Option<String> {
    element
        .select(&CELL_SELECTOR)
        .nth(index)
        .map(base::inner_text)
        .filter(|text| !text.is_empty())
}

fn row_date_scan(element: &ElementRef<'_>) -> Option<String> {
    element
        .select(&CELL_SELECTOR)
        .map(base::inner_text)
        .find(|text| CELL_DATE_HINT.is_match(text))
}

pub(crate) fn extract_records(document: &Html) -> Vec<RawRecord> {
    let mut records = Vec::new();

    for element in document.select(&ELEMENT_SELECTOR) {
        let mut title = base::first_text(&element, &TITLE_SELECTOR);
        if title.is_none() && is_table_row(&element) {
            title = cell_text(&element, 0);
        }
        let Some(title) = base::accept_title(title) else {
            continue;
        };

        let mut description = base::first_text(&element, &DESCRIPTION_SELECTOR);
        if description.is_none() && is_table_row(&element) {
            description = cell_text(&element, 1);
        }

        let date_node = element.select(&DATE_SELECTOR).next();
        let mut date_string = date_node.map(base::inner_text).unwrap_or_default();
        if date_string.is_empty() {
            if let Some(attr) = date_node.and_then(|node| node.value().attr("datetime")) {
                date_string = attr.to_string();
            }
        }
        if date_string.is_empty() && is_table_row(&element) {
            date_string = row_date_scan(&element).unwrap_or_default();
        }
        if date_string.is_empty() {
            date_string = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        }

        let location = base::first_text(&element, &LOCATION_SELECTOR)
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let url = base::absolute_url(ORIGIN, base::first_attr(&element, &LINK_SELECTOR, "href"));
        let image_url = base::absolute_url(ORIGIN, base::first_attr(&element, &IMAGE_SELECTOR, "src"));

        records.push(RawRecord {
            title,
            description,
            date_string,
            location: Some(location),
            url,
            category: Some(CATEGORY.to_string()),
            image_url,
            ..RawRecord::default()
        });
    }

    records
}
