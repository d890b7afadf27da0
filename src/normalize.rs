//! Item normalization and the recency predicate.
//!
//! Turns a [`RawFeedItem`] into a [`NewsItem`]: the summary loses its markup
//! and is capped at [`MAX_SUMMARY_LENGTH`] characters (plus an ellipsis), and
//! the raw publish string becomes an optional UTC timestamp.

use chrono::{DateTime, Duration, Utc};

use crate::models::{NewsItem, RawFeedItem};
use crate::utils::{parse_timestamp, strip_markup, truncate_text, MAX_SUMMARY_LENGTH};

/// Items older than this are not shown in the default view.
pub const RECENCY_WINDOW_HOURS: i64 = 24;

pub fn normalize(raw: RawFeedItem, source_name: &str) -> NewsItem {
    let summary = truncate_text(&strip_markup(&raw.summary_raw), MAX_SUMMARY_LENGTH);
    NewsItem {
        title: raw.title,
        link: raw.link,
        source: source_name.to_string(),
        published_at: parse_timestamp(&raw.published_raw),
        summary,
    }
}

/// Whether an item published at `ts` is inside the recency window ending at `now`.
///
/// A missing timestamp counts as recent. Timestamps in the future are recent too.
pub fn is_recent_at(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match ts {
        None => true,
        Some(ts) => now - ts < Duration::hours(RECENCY_WINDOW_HOURS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ELLIPSIS;
    use chrono::TimeZone;

    fn raw(summary: &str, published: &str) -> RawFeedItem {
        RawFeedItem {
            title: "X".to_string(),
            link: "http://a".to_string(),
            published_raw: published.to_string(),
            summary_raw: summary.to_string(),
        }
    }

    #[test]
    fn test_strips_markup_from_summary() {
        let item = normalize(raw("<p>Hello <b>world</b></p>", ""), "Feed");
        assert_eq!(item.title, "X");
        assert_eq!(item.link, "http://a");
        assert_eq!(item.source, "Feed");
        assert_eq!(item.summary, "Hello world");
        assert_eq!(item.published_at, None);
    }

    #[test]
    fn test_long_summary_is_cut_to_200_plus_ellipsis() {
        let item = normalize(raw(&"a".repeat(250), ""), "Feed");
        assert_eq!(item.summary.chars().count(), 201);
        assert!(item.summary.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_parses_publish_time() {
        let item = normalize(raw("", "2025-05-06T08:30:00Z"), "Feed");
        assert!(item.published_at.is_some());
        let item = normalize(raw("", "not a date"), "Feed");
        assert!(item.published_at.is_none());
    }

    #[test]
    fn test_recency_window_boundaries() {
        let now = Utc::now();
        assert!(is_recent_at(None, now));
        assert!(is_recent_at(Some(now - Duration::hours(2)), now));
        assert!(is_recent_at(Some(now - Duration::hours(23)), now));
        assert!(!is_recent_at(Some(now - Duration::hours(24)), now));
        assert!(!is_recent_at(Some(now - Duration::hours(48)), now));
        assert!(is_recent_at(Some(now + Duration::hours(1)), now));
    }

    #[test]
    fn test_stale_utc_dated_item_is_not_recent() {
        let now = Utc.with_ymd_and_hms(2025, 5, 8, 8, 30, 0).unwrap();
        for published in ["Tue, 06 May 2025 08:30:00 UTC", "2025-05-06T08:30:00+0000"] {
            let item = normalize(raw("", published), "Feed");
            assert!(item.published_at.is_some(), "{published}");
            assert!(!is_recent_at(item.published_at, now), "{published}");
        }
    }

    #[test]
    fn test_unknown_time_is_recent_now() {
        assert!(is_recent_at(None, Utc::now()));
    }
}
