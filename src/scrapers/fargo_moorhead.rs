//! fargomoorhead.org events scraper.
//!
//! The listing page renders one card per event with a mini-calendar badge
//! (`.mini-date-container`) that carries only a month label and a day label.
//! The year never appears on the card, so the date string is assembled as
//! `"<month> <day>, <current year>"`. Cards without a badge fall back to the
//! scrape time so the normalizer still produces a total date.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Local, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use super::{EventScraper, base};
use crate::models::{Event, EventSource, RawRecord};
use crate::normalize::normalize;
use crate::page::Page;

const URL: &str = "https://www.fargomoorhead.org/events/";
const ORIGIN: &str = "https://www.fargomoorhead.org";

static EVENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-type="events"]"#).expect("fargo-moorhead cards"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h4 a, h3 a, h2 a, .info h4, .top-info h4").expect("fargo-moorhead title")
});
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".description, .excerpt, .summary, .info p, .bottom-info")
        .expect("fargo-moorhead description")
});
static MONTH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".mini-date-container .month").expect("fargo-moorhead month"));
static DAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".mini-date-container .day").expect("fargo-moorhead day"));
static LOCATION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".location, .venue, .address, .info .location").expect("fargo-moorhead location")
});
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/event/"]"#).expect("fargo-moorhead link"));
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img.thumb, .image img").expect("fargo-moorhead image"));

pub struct FargoMoorheadScraper;

#[async_trait]
impl EventScraper for FargoMoorheadScraper {
    fn source(&self) -> EventSource {
        EventSource::FargoMoorhead
    }

    fn url(&self) -> &'static str {
        URL
    }

    #[instrument(level = "info", skip_all)]
    async fn scrape(&self) -> Result<Vec<Event>> {
        let mut page = Page::new()?;
        page.goto(URL).await?;
        page.wait(3000).await;
        info!("Fargo-Moorhead page loaded, looking for events");

        let records = {
            let document = page.document();
            extract_records(&document)
        };
        info!(count = records.len(), "Fargo-Moorhead records extracted");

        Ok(records
            .into_iter()
            .map(|record| normalize(record, self.source()))
            .collect())
    }
}

pub(crate) fn extract_records(document: &Html) -> Vec<RawRecord> {
    let mut records = Vec::new();

    for element in document.select(&EVENT_SELECTOR) {
        let Some(title) = base::accept_title(base::first_text(&element, &TITLE_SELECTOR)) else {
            debug!("Skipping card without a usable title");
            continue;
        };

        let description = base::first_text(&element, &DESCRIPTION_SELECTOR);

        let mut date_string = String::new();
        if let (Some(month), Some(day)) = (
            base::first_text(&element, &MONTH_SELECTOR),
            base::first_text(&element, &DAY_SELECTOR),
        ) {
            date_string = format!("{} {}, {}", month, day, Local::now().year());
            debug!(title = %title, date = %date_string, "Extracted mini-calendar date");
        }
        if date_string.is_empty() {
            date_string = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        }

        let location = base::first_text(&element, &LOCATION_SELECTOR);
        let url = base::absolute_url(ORIGIN, base::first_attr(&element, &LINK_SELECTOR, "href"));
        let image_url = base::absolute_url(ORIGIN, base::first_attr(&element, &IMAGE_SELECTOR, "src"));

        records.push(RawRecord {
            title,
            description,
            date_string,
            location,
            url,
            image_url,
            ..RawRecord::default()
        });
    }

    records
}
