//! CSV export.
//!
//! One header row, then one row per event. A field is quoted (with internal
//! quotes doubled) if and only if it contains a comma, a quote, or a
//! newline. Invalid dates become empty fields.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::info;

use crate::models::Event;

pub const HEADER: &str = "Title,Date,End Date,Location,Description,Category,Price,Source,URL";

/// Quote a field only when its content requires it.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn event_row(event: &Event) -> String {
    [
        escape_field(&event.title),
        event.date.to_iso().unwrap_or_default(),
        event
            .end_date
            .and_then(|date| date.to_iso())
            .unwrap_or_default(),
        escape_field(event.location.as_deref().unwrap_or("")),
        escape_field(event.description.as_deref().unwrap_or("")),
        escape_field(event.category.as_deref().unwrap_or("")),
        escape_field(event.price.as_deref().unwrap_or("")),
        event.source.label().to_string(),
        escape_field(event.url.as_deref().unwrap_or("")),
    ]
    .join(",")
}

/// Serialize events as CSV text.
pub fn to_csv_string(events: &[Event]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(events.iter().map(event_row));
    lines.join("\n")
}

/// Write the CSV export to `path`, creating parent directories as needed.
pub async fn write_events(events: &[Event], path: &Path) -> Result<()> {
    let csv = to_csv_string(events);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    fs::write(path, csv)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), count = events.len(), "Events exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::{EventDate, EventSource};

    fn sample_event(title: &str) -> Event {
        Event {
            title: title.to_string(),
            description: None,
            date: EventDate::Known(Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()),
            end_date: None,
            location: None,
            url: None,
            source: EventSource::FargoMoorhead,
            category: None,
            price: None,
            image_url: None,
        }
    }

    #[test]
    fn test_escape_field_quotes_only_when_needed() {
        assert_eq!(escape_field("Jazz Night"), "Jazz Night");
        assert_eq!(
            escape_field("Tom's \"Big\" Show, Live"),
            "\"Tom's \"\"Big\"\" Show, Live\""
        );
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_header_and_rows() {
        let csv = to_csv_string(&[sample_event("Jazz Night")]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Title,Date,End Date,Location,Description,Category,Price,Source,URL"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Jazz Night,2025-06-10T00:00:00.000Z,"));
        assert!(row.contains("fargomoorhead.org"));
    }

    #[test]
    fn test_invalid_date_is_empty_field() {
        let mut event = sample_event("Mystery Show");
        event.date = EventDate::Invalid;
        let csv = to_csv_string(&[event]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("Mystery Show,,"));
    }

    #[tokio::test]
    async fn test_write_events_creates_file() {
        let dir = std::env::temp_dir().join(format!("fargo-haps-csv-{}", std::process::id()));
        let path = dir.join("events.csv");
        write_events(&[sample_event("Jazz Night")], &path)
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written.lines().count(), 2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
