//! Data models for scraped and canonical events.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawRecord`]: loosely-typed data pulled straight from a rendered page
//! - [`Event`]: the canonical, normalized event entity
//! - [`EventDate`]: a total date type that keeps sorting well-defined even
//!   when a page carried an unparseable date
//! - [`EventSource`]: the closed set of scraped websites
//!
//! JSON field names use camelCase to match the export schema consumed by
//! downstream clients.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A point in time attached to an [`Event`].
///
/// Every event carries a date so that sorting is total. `Invalid` is the
/// explicit sentinel for strings that looked like an ISO date but failed
/// calendar validation (e.g. `2025-13-40`); it serializes as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    Known(DateTime<Utc>),
    Invalid,
}

impl EventDate {
    pub fn is_valid(&self) -> bool {
        matches!(self, EventDate::Known(_))
    }

    /// Calendar-day representation used in dedup keys: `YYYY-MM-DD`, or the
    /// literal `invalid-date` when no valid point in time exists.
    pub fn day_key(&self) -> String {
        match self {
            EventDate::Known(dt) => dt.date_naive().to_string(),
            EventDate::Invalid => "invalid-date".to_string(),
        }
    }

    /// ISO-8601 string with millisecond precision, or `None` when invalid.
    pub fn to_iso(&self) -> Option<String> {
        match self {
            EventDate::Known(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            EventDate::Invalid => None,
        }
    }

    /// Total ordering key: known dates ascend by timestamp, invalid dates
    /// sort after every known date.
    pub fn sort_key(&self) -> (u8, i64) {
        match self {
            EventDate::Known(dt) => (0, dt.timestamp_millis()),
            EventDate::Invalid => (1, 0),
        }
    }

    /// Human-readable day for CLI output.
    pub fn display_day(&self) -> String {
        match self {
            EventDate::Known(dt) => dt.date_naive().format("%a %b %e %Y").to_string(),
            EventDate::Invalid => "invalid date".to_string(),
        }
    }
}

impl Serialize for EventDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.to_iso() {
            Some(iso) => serializer.serialize_str(&iso),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for EventDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| EventDate::Known(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
            None => Ok(EventDate::Invalid),
        }
    }
}

/// The closed set of scraped websites.
///
/// Each value doubles as a stable, human-readable provenance label used in
/// dedup keys, exports, and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    #[serde(rename = "fargomoorhead.org")]
    FargoMoorhead,
    #[serde(rename = "fargounderground.com")]
    FargoUnderground,
    #[serde(rename = "Moorhead Public Library")]
    MoorheadLibrary,
}

impl EventSource {
    pub fn label(&self) -> &'static str {
        match self {
            EventSource::FargoMoorhead => "fargomoorhead.org",
            EventSource::FargoUnderground => "fargounderground.com",
            EventSource::MoorheadLibrary => "Moorhead Public Library",
        }
    }

    /// Filename-safe form of the label: every non-alphanumeric character
    /// becomes a hyphen.
    pub fn slug(&self) -> String {
        self.label()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A canonical event after normalization.
///
/// Instances are immutable after creation; they live for the duration of one
/// aggregation run and are serialized out, never persisted internally.
/// `url` and `image_url`, when present, are always absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: EventDate,
    /// Present only when a distinct end was found; exported as explicit null
    /// otherwise.
    #[serde(default)]
    pub end_date: Option<EventDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: EventSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Unnormalized data extracted from one page element during one scrape call.
///
/// Owned transiently by a single scraper invocation and converted 1:1 (or
/// dropped) into an [`Event`] within that same call.
#[derive(Debug, Default, Clone)]
pub struct RawRecord {
    pub title: String,
    pub description: Option<String>,
    /// Free-form date string; possibly empty, possibly missing its year.
    pub date_string: String,
    pub end_date_string: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn known(y: i32, m: u32, d: u32) -> EventDate {
        EventDate::Known(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_event_date_day_key() {
        assert_eq!(known(2025, 6, 15).day_key(), "2025-06-15");
        assert_eq!(EventDate::Invalid.day_key(), "invalid-date");
    }

    #[test]
    fn test_event_date_serializes_as_iso_or_null() {
        let json = serde_json::to_string(&known(2025, 6, 15)).unwrap();
        assert_eq!(json, "\"2025-06-15T00:00:00.000Z\"");
        let json = serde_json::to_string(&EventDate::Invalid).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_event_date_roundtrip() {
        let date: EventDate = serde_json::from_str("\"2025-06-15T00:00:00.000Z\"").unwrap();
        assert_eq!(date, known(2025, 6, 15));
        let date: EventDate = serde_json::from_str("null").unwrap();
        assert_eq!(date, EventDate::Invalid);
    }

    #[test]
    fn test_invalid_sorts_after_known() {
        assert!(EventDate::Invalid.sort_key() > known(9999, 12, 31).sort_key());
        assert!(known(2025, 6, 1).sort_key() < known(2025, 6, 10).sort_key());
    }

    #[test]
    fn test_source_labels_and_slugs() {
        assert_eq!(EventSource::FargoMoorhead.label(), "fargomoorhead.org");
        assert_eq!(EventSource::FargoMoorhead.slug(), "fargomoorhead-org");
        assert_eq!(
            EventSource::MoorheadLibrary.slug(),
            "Moorhead-Public-Library"
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event {
            title: "Jazz Night".to_string(),
            description: None,
            date: known(2025, 6, 10),
            end_date: None,
            location: Some("Downtown".to_string()),
            url: None,
            source: EventSource::FargoMoorhead,
            category: None,
            price: None,
            image_url: None,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["title"], "Jazz Night");
        assert_eq!(value["source"], "fargomoorhead.org");
        // endDate is always present, null when absent
        assert!(value.as_object().unwrap().contains_key("endDate"));
        assert_eq!(value["endDate"], serde_json::Value::Null);
        // absent optionals are omitted entirely
        assert!(!value.as_object().unwrap().contains_key("description"));
    }
}
