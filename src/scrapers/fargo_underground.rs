//! fargounderground.com events scraper.
//!
//! The calendar markup varies between themes, so element discovery walks an
//! ordered list of candidate selectors and uses the first one that matches.
//! Date acquisition is the most layered of the three sources: a structured
//! date element's machine-readable attribute, then its text, then a pattern
//! search of the card's full text, then the page-level datepicker context
//! shared by every card, then an empty string for the normalizer to handle.
//!
//! Navigation failure on the photo view retries the plain events page once;
//! if that also fails the scraper reports zero records rather than an error.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument, warn};

use super::{EventScraper, base};
use crate::models::{Event, EventSource, RawRecord};
use crate::normalize::normalize;
use crate::page::Page;

const URL: &str = "https://fargounderground.com/events/photo/";
const FALLBACK_URL: &str = "https://fargounderground.com/events/";
const ORIGIN: &str = "https://fargounderground.com";

const SELECTOR_WAIT: Duration = Duration::from_secs(10);

/// Venue pages that show up between event cards on this site.
const VENUE_DENYLIST: [&str; 3] = ["cowboy jack's", "duffy's tavern", "parachigo"];

static CANDIDATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article.event",
        ".event-item",
        ".event-listing",
        r#"article[class*="event"]"#,
        ".tribe-event",
        ".event-card",
        "article.post",
        "article",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("fargo-underground candidate selector"))
    .collect()
});
static DATEPICKER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".tribe-common-h3.tribe-events-c-top-bar__datepicker-button")
        .expect("fargo-underground datepicker")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"h1, h2, h3, h4, .event-title, .entry-title, [class*="title"]"#)
        .expect("fargo-underground title")
});
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".event-description, .entry-content, .excerpt, p, [class*="description"]"#)
        .expect("fargo-underground description")
});
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".event-date, .date, time, [datetime], [class*="date"]"#)
        .expect("fargo-underground date")
});
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("fargo-underground link"));
static LOCATION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".event-location, .location, .venue, [class*="location"], [class*="venue"]"#)
        .expect("fargo-underground location")
});
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("fargo-underground image"));
static CATEGORY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".category, .event-category, .tag, [class*="category"]"#)
        .expect("fargo-underground category")
});

pub struct FargoUndergroundScraper;

#[async_trait]
impl EventScraper for FargoUndergroundScraper {
    fn source(&self) -> EventSource {
        EventSource::FargoUnderground
    }

    fn url(&self) -> &'static str {
        URL
    }

    #[instrument(level = "info", skip_all)]
    async fn scrape(&self) -> Result<Vec<Event>> {
        let mut page = Page::new()?;

        let mut loaded = false;
        match page.goto(URL).await {
            Ok(()) => {
                page.wait(5000).await;
                if !page.wait_for_selector("body", SELECTOR_WAIT).await {
                    debug!("Body selector timeout, continuing anyway");
                }
                info!("Fargo Underground events page loaded, looking for events");
                loaded = true;
            }
            Err(e) => {
                warn!(error = %e, "Error navigating to Fargo Underground; trying fallback page");
                match page.goto(FALLBACK_URL).await {
                    Ok(()) => {
                        page.wait(5000).await;
                        info!("Loaded fallback events page");
                        loaded = true;
                    }
                    Err(fallback_error) => {
                        error!(error = %fallback_error, "Fallback page also failed");
                    }
                }
            }
        }
        if !loaded {
            return Ok(Vec::new());
        }

        let records = {
            let document = page.document();
            extract_records(&document)
        };
        info!(count = records.len(), "Fargo Underground records extracted");

        Ok(records
            .into_iter()
            .map(|record| normalize(record, self.source()))
            .collect())
    }
}

pub(crate) fn extract_records(document: &Html) -> Vec<RawRecord> {
    // Date context shared by every card on the page, e.g. the currently
    // selected range in the calendar's datepicker button.
    let page_date_context = document
        .select(&DATEPICKER_SELECTOR)
        .next()
        .map(base::inner_text)
        .unwrap_or_default();
    if !page_date_context.is_empty() {
        debug!(context = %page_date_context, "Page date context");
    }

    let mut elements = Vec::new();
    for selector in CANDIDATE_SELECTORS.iter() {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            debug!(count = found.len(), "Matched candidate event selector");
            elements = found;
            break;
        }
    }
    if elements.is_empty() {
        debug!("No event elements found on Fargo Underground events page");
        return Vec::new();
    }

    let mut records = Vec::new();
    for element in elements {
        let Some(title) = base::accept_title(base::first_text(&element, &TITLE_SELECTOR)) else {
            continue;
        };
        if VENUE_DENYLIST.contains(&title.to_lowercase().as_str()) {
            debug!(title = %title, "Skipping venue page");
            continue;
        }

        let description = base::first_text(&element, &DESCRIPTION_SELECTOR);
        let url = base::absolute_url(ORIGIN, base::first_attr(&element, &LINK_SELECTOR, "href"));

        let mut date_string = element
            .select(&DATE_SELECTOR)
            .next()
            .map(|node| {
                node.value()
                    .attr("datetime")
                    .or_else(|| node.value().attr("data-date"))
                    .map(str::to_string)
                    .unwrap_or_else(|| base::inner_text(node))
            })
            .unwrap_or_default();
        if date_string.is_empty() {
            date_string = base::find_date_in_text(&base::inner_text(element)).unwrap_or_default();
        }
        if date_string.is_empty() && !page_date_context.is_empty() {
            debug!(title = %title, context = %page_date_context, "Using page date context");
            date_string = page_date_context.clone();
        }

        let location = base::first_text(&element, &LOCATION_SELECTOR);
        let image_url = base::absolute_url(ORIGIN, base::first_attr(&element, &IMAGE_SELECTOR, "src"));
        let category = base::first_text(&element, &CATEGORY_SELECTOR);

        records.push(RawRecord {
            title,
            description,
            date_string,
            location,
            url,
            category,
            image_url,
            ..RawRecord::default()
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
    <div class="tribe-common-h3 tribe-events-c-top-bar__datepicker-button">June 2025</div>
    <article class="event">
        <h2 class="event-title">Food Truck Friday!</h2>
        <p>Street food downtown.</p>
        <time datetime="2025-06-20">June 20</time>
        <div class="event-location">Broadway</div>
        <a href="/event/food-truck-friday/">Details</a>
        <span class="event-category">Food</span>
    </article>
    <article class="event">
        <h2 class="event-title">Duffy's Tavern</h2>
        <a href="/venue/duffys/">Venue</a>
    </article>
    <article class="event">
        <h2 class="event-title">Open Mic Night</h2>
        <p>Sign up at the door. Happening June 21, 2025 at 8pm.</p>
        <a href="/event/open-mic/">Details</a>
    </article>
    <article class="event">
        <h2 class="event-title">Trivia Tuesday</h2>
        <a href="/event/trivia/">Details</a>
    </article>
    "#;

    #[test]
    fn test_denylisted_venues_are_dropped() {
        let document = Html::parse_document(SAMPLE_HTML);
        let records = extract_records(&document);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Food Truck Friday!", "Open Mic Night", "Trivia Tuesday"]
        );
    }

    #[test]
    fn test_date_heuristic_precedence() {
        let document = Html::parse_document(SAMPLE_HTML);
        let records = extract_records(&document);

        // machine-readable attribute wins
        assert_eq!(records[0].date_string, "2025-06-20");
        // pattern search of the card's full text
        assert_eq!(records[1].date_string, "June 21, 2025");
        // page-level datepicker context when the card itself has nothing
        assert_eq!(records[2].date_string, "June 2025");
    }

    #[test]
    fn test_relative_links_resolved_against_origin() {
        let document = Html::parse_document(SAMPLE_HTML);
        let records = extract_records(&document);
        assert_eq!(
            records[0].url.as_deref(),
            Some("https://fargounderground.com/event/food-truck-friday/")
        );
    }

    #[test]
    fn test_no_candidate_elements_yields_empty() {
        let document = Html::parse_document("<main><p>maintenance mode</p></main>");
        assert!(extract_records(&document).is_empty());
    }
}
