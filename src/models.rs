//! Data models shared by every stage of the pipeline.
//!
//! - [`Source`]: one configured feed endpoint
//! - [`RawFeedItem`]: what the feed parser pulls out of a single `<item>`/`<entry>`
//! - [`NewsItem`]: the normalized, canonical news record
//! - [`FetchOutcome`]: merged result of one fetch cycle, including failed sources
//! - [`SnapshotRecord`]: the compact record persisted in a daily snapshot
//! - [`BootstrapData`]: the seed/export document (`data/news.json`)
//!
//! Field names of the serialized types follow the external JSON format, which
//! uses `generatedAt` in camelCase, hence the `rename` attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::{format_display_time, parse_timestamp};

/// A configured feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Display name, used to attribute items and failures.
    pub name: String,
    /// Feed URL.
    pub endpoint: String,
}

impl Source {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Transient parse result for one feed element, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    pub title: String,
    pub link: String,
    pub published_raw: String,
    pub summary_raw: String,
}

/// A normalized news item.
///
/// `title` and `link` must both be non-empty for the item to survive
/// aggregation. `summary` is plain text of at most 200 characters plus an
/// optional trailing ellipsis. `published_at` is `None` only when the feed's
/// timestamp could not be parsed; such items count as recent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
}

impl NewsItem {
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }

    /// Compact record with a pre-formatted display time, as stored in snapshots.
    pub fn to_snapshot_record(&self) -> SnapshotRecord {
        SnapshotRecord {
            title: self.title.clone(),
            link: self.link.clone(),
            source: self.source.clone(),
            time: format_display_time(self.published_at),
            summary: self.summary.clone(),
        }
    }
}

/// Result of fetching every configured source once.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Items from all successful sources, flattened in configuration order.
    pub items: Vec<NewsItem>,
    /// Names of the sources whose fetch failed, in configuration order.
    pub failed_sources: Vec<String>,
}

/// One entry of a daily snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SnapshotRecord {
    pub title: String,
    pub link: String,
    pub source: String,
    /// Display timestamp, already formatted.
    pub time: String,
    pub summary: String,
}

/// A news item as it appears in the bootstrap file, with an ISO date string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BootstrapItem {
    pub title: String,
    pub link: String,
    pub source: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub summary: String,
}

impl BootstrapItem {
    pub fn from_news_item(item: &NewsItem) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
            source: item.source.clone(),
            date: item.published_at.map(|d| d.to_rfc3339()),
            summary: item.summary.clone(),
        }
    }

    pub fn into_news_item(self) -> NewsItem {
        let published_at = self.date.as_deref().and_then(parse_timestamp);
        NewsItem {
            title: self.title,
            link: self.link,
            source: self.source,
            published_at,
            summary: self.summary,
        }
    }
}

/// The bootstrap data document.
///
/// Read once at start-up to seed an empty store and to show an initial view,
/// and written by the export step.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BootstrapData {
    #[serde(rename = "generatedAt", default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub items: Vec<BootstrapItem>,
    #[serde(default)]
    pub snapshots: BTreeMap<String, Vec<SnapshotRecord>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(title: &str, link: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            source: "Example".to_string(),
            published_at: None,
            summary: String::new(),
        }
    }

    #[test]
    fn test_news_item_validity() {
        assert!(item("X", "http://a").is_valid());
        assert!(!item("", "http://a").is_valid());
        assert!(!item("X", "").is_valid());
    }

    #[test]
    fn test_snapshot_record_unknown_time() {
        let record = item("X", "http://a").to_snapshot_record();
        assert_eq!(record.title, "X");
        assert_eq!(record.link, "http://a");
        assert_eq!(record.source, "Example");
        assert_eq!(record.time, "Unknown time");
    }

    #[test]
    fn test_bootstrap_item_keeps_timestamp() {
        let mut news = item("X", "http://a");
        news.published_at = Some(Utc.with_ymd_and_hms(2025, 5, 6, 8, 30, 0).unwrap());
        let back = BootstrapItem::from_news_item(&news).into_news_item();
        assert_eq!(back.published_at, news.published_at);
    }

    #[test]
    fn test_bootstrap_item_bad_date_is_none() {
        let raw = BootstrapItem {
            title: "X".into(),
            link: "http://a".into(),
            source: "S".into(),
            date: Some("yesterday-ish".into()),
            summary: String::new(),
        };
        assert_eq!(raw.into_news_item().published_at, None);
    }

    #[test]
    fn test_bootstrap_data_deserialization() {
        let json = r#"{
            "generatedAt": "2025-05-06T10:00:00+00:00",
            "items": [
                {"title": "T", "link": "http://t", "source": "S", "date": "2025-05-06T09:00:00+00:00", "summary": "s"}
            ],
            "snapshots": {
                "2025-05-06": [
                    {"title": "T", "link": "http://t", "source": "S", "time": "2025-05-06 09:00", "summary": "s"}
                ]
            }
        }"#;
        let data: BootstrapData = serde_json::from_str(json).unwrap();
        assert_eq!(data.generated_at.as_deref(), Some("2025-05-06T10:00:00+00:00"));
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.snapshots["2025-05-06"][0].time, "2025-05-06 09:00");
    }

    #[test]
    fn test_bootstrap_data_missing_sections() {
        let data: BootstrapData = serde_json::from_str("{}").unwrap();
        assert!(data.items.is_empty());
        assert!(data.snapshots.is_empty());
    }
}
