//! Filtering and ranking of a fetch cycle's merged items.
//!
//! Ranking is newest first. Undated items are kept by the recency filter but
//! sort as if published at the Unix epoch, so they end up below every dated
//! item. That mismatch is accepted behavior.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{FetchOutcome, NewsItem};
use crate::normalize::is_recent_at;
use crate::store::SnapshotStore;

/// Filter and sort the merged items of `outcome` against `now`.
///
/// Drops items with an empty title or link and items outside the recency
/// window, then sorts by publish time descending. The sort is stable, so ties
/// keep their fetch order.
pub fn aggregate_at(outcome: &FetchOutcome, now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = outcome
        .items
        .iter()
        .filter(|item| item.is_valid())
        .filter(|item| is_recent_at(item.published_at, now))
        .cloned()
        .collect();
    items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    debug!(
        merged = outcome.items.len(),
        kept = items.len(),
        "Aggregated fetch outcome"
    );
    items
}

fn sort_key(item: &NewsItem) -> i64 {
    item.published_at.map_or(0, |ts| ts.timestamp_millis())
}

/// Whether the automatic path should write a snapshot for `today_key`.
pub fn should_snapshot(store: &SnapshotStore, today_key: &str, items: &[NewsItem]) -> bool {
    !items.is_empty() && !store.contains(today_key)
}
