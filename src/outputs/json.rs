//! JSON export.
//!
//! The output is an object with `generated` (timestamp of the export),
//! `count`, and `events`. Dates serialize as ISO-8601 strings; an invalid
//! date becomes an explicit `null` rather than a bogus timestamp string.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::info;

use crate::models::Event;

#[derive(Serialize)]
struct ExportDocument<'a> {
    generated: String,
    count: usize,
    events: &'a [Event],
}

/// Serialize events into the export envelope.
pub fn to_json_string(events: &[Event]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ExportDocument {
        generated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        count: events.len(),
        events,
    })
}

/// Write the JSON export to `path`, creating parent directories as needed.
pub async fn write_events(events: &[Event], path: &Path) -> Result<()> {
    let json = to_json_string(events).context("failed to serialize events")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), count = events.len(), "Events exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::{EventDate, EventSource};

    fn sample_events() -> Vec<Event> {
        vec![
            Event {
                title: "Jazz Night".to_string(),
                description: Some("Live jazz downtown.".to_string()),
                date: EventDate::Known(Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()),
                end_date: None,
                location: Some("Broadway Square".to_string()),
                url: Some("https://www.fargomoorhead.org/event/jazz-night/".to_string()),
                source: EventSource::FargoMoorhead,
                category: None,
                price: None,
                image_url: None,
            },
            Event {
                title: "Mystery Show".to_string(),
                description: None,
                date: EventDate::Invalid,
                end_date: None,
                location: None,
                url: None,
                source: EventSource::FargoUnderground,
                category: None,
                price: None,
                image_url: None,
            },
        ]
    }

    #[test]
    fn test_envelope_shape() {
        let json = to_json_string(&sample_events()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["generated"].is_string());
        assert_eq!(value["count"], 2);
        assert_eq!(value["events"].as_array().unwrap().len(), 2);
        assert_eq!(value["events"][0]["date"], "2025-06-10T00:00:00.000Z");
        assert_eq!(value["events"][0]["source"], "fargomoorhead.org");
    }

    #[test]
    fn test_invalid_date_serializes_as_null() {
        let json = to_json_string(&sample_events()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["events"][1]["date"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_write_events_roundtrip() {
        let dir = std::env::temp_dir().join(format!("fargo-haps-json-{}", std::process::id()));
        let path = dir.join("events.json");
        write_events(&sample_events(), &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["count"], 2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
