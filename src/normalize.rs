//! Conversion of raw scraped records into canonical [`Event`]s.
//!
//! Normalization never fails: every [`RawRecord`] becomes an [`Event`], with
//! per-field fallbacks absorbing whatever the source pages got wrong. Dates
//! are the hard part; the resolution order is:
//!
//! 1. A date string that matches no recognized shape and is shorter than six
//!    characters is replaced by a `YYYY-MM-DD` substring recovered from the
//!    record's URL, when one exists.
//! 2. ISO-prefixed strings parse as calendar dates (full RFC3339 keeps its
//!    time of day). An ISO-looking string that fails calendar validation
//!    yields [`EventDate::Invalid`].
//! 3. A fixed ordered list of common format templates.
//! 4. A generic free-form parse (RFC3339/RFC2822, weekday-prefixed forms,
//!    month-day with the year inferred).
//! 5. The current time, as a non-fatal sentinel. One bad date never blocks
//!    the pipeline.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{Event, EventDate, EventSource, RawRecord};

static ISO_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid iso prefix regex"));
static MONTH_DAY_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}$")
        .expect("valid month-day-year regex")
});
static SLASH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("valid slash date regex"));
static URL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("valid url date regex"));

const COMMON_FORMATS: [&str; 5] = [
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
];

/// Convert one raw record into a canonical event for the given source.
pub fn normalize(raw: RawRecord, source: EventSource) -> Event {
    let mut date_string = raw.date_string.clone();

    // An unusably short date string may still be recoverable from the URL;
    // event detail pages often embed the day as /YYYY-MM-DD/.
    if looks_unusable(date_string.trim()) {
        if let Some(url) = raw.url.as_deref() {
            if let Some(found) = URL_DATE_RE.find(url) {
                debug!(url, recovered = found.as_str(), "Recovered date from record URL");
                date_string = found.as_str().to_string();
            }
        }
    }

    let date = parse_date(&date_string);
    if !date.is_valid() {
        debug!(title = %raw.title, date_string, "Record date failed calendar validation");
    }

    Event {
        title: raw.title,
        description: raw.description,
        date,
        end_date: raw.end_date_string.as_deref().map(parse_date),
        location: raw.location,
        url: raw.url,
        source,
        category: raw.category,
        price: raw.price,
        image_url: raw.image_url,
    }
}

fn looks_unusable(trimmed: &str) -> bool {
    trimmed.chars().count() < 6 && !matches_recognized_shape(trimmed)
}

fn matches_recognized_shape(trimmed: &str) -> bool {
    ISO_PREFIX_RE.is_match(trimmed)
        || MONTH_DAY_YEAR_RE.is_match(trimmed)
        || SLASH_DATE_RE.is_match(trimmed)
}

/// Parse a date string into an [`EventDate`], falling back to "now" when
/// nothing matches. Never fails.
pub fn parse_date(input: &str) -> EventDate {
    let cleaned = input.trim();

    if ISO_PREFIX_RE.is_match(cleaned) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
            return EventDate::Known(dt.with_timezone(&Utc));
        }
        // Digits and hyphens are single bytes, so the 10-char prefix slice
        // is safe here.
        return match NaiveDate::parse_from_str(&cleaned[..10], "%Y-%m-%d") {
            Ok(date) => known_midnight(date),
            Err(_) => EventDate::Invalid,
        };
    }

    for fmt in COMMON_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return known_midnight(date);
        }
    }

    if let Some(date) = parse_freeform(cleaned) {
        return date;
    }

    debug!(input, "Unparseable date; using current time sentinel");
    EventDate::Known(Utc::now())
}

fn known_midnight(date: NaiveDate) -> EventDate {
    match date.and_hms_opt(0, 0, 0) {
        Some(naive) => EventDate::Known(naive.and_utc()),
        None => EventDate::Invalid,
    }
}

fn parse_freeform(text: &str) -> Option<EventDate> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(EventDate::Known(dt.with_timezone(&Utc)));
    }

    for fmt in ["%A, %B %d, %Y", "%a, %b %d, %Y", "%A %B %d, %Y", "%A %m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(known_midnight(date));
        }
    }

    // Month-day with no year, e.g. "June 15". Assume the current year; if
    // that day has already passed, the listing is for next year.
    let current_year = Local::now().year();
    for fmt in ["%B %d, %Y", "%b %d, %Y"] {
        let with_year = format!("{}, {}", text, current_year);
        if let Ok(mut date) = NaiveDate::parse_from_str(&with_year, fmt) {
            let today = Local::now().date_naive();
            if date < today {
                date = date.with_year(current_year + 1)?;
            }
            return Some(known_midnight(date));
        }
    }

    None
}
