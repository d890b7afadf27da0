//! One refresh cycle, and the manual "save current view" action.
//!
//! A refresh fetches every source, ranks the merged items, and writes today's
//! snapshot if there is none yet. The caller always gets the ranked items and
//! the failed source names. A failed snapshot write travels with them in
//! [`RefreshReport::snapshot_error`] rather than replacing them.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use crate::aggregate::{aggregate_at, should_snapshot};
use crate::config::FeedConfig;
use crate::error::StoreError;
use crate::feeds::fetch::fetch_all;
use crate::feeds::transport::FeedTransport;
use crate::models::{NewsItem, SnapshotRecord};
use crate::store::SharedStore;
use crate::utils::date_key;

/// What a refresh produced for the consumer.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Ranked items, newest first.
    pub items: Vec<NewsItem>,
    /// Every item fetched this cycle, before filtering, in fetch order.
    pub fetched: Vec<NewsItem>,
    /// Sources that could not be fetched, in configuration order.
    pub failed_sources: Vec<String>,
    /// Whether today's snapshot was written by this refresh.
    pub snapshot_written: bool,
    /// Set when today's snapshot was due but could not be saved.
    pub snapshot_error: Option<StoreError>,
}

impl RefreshReport {
    /// Partial-failure notice, e.g. `"Some sources failed: A, B"`.
    pub fn failure_notice(&self) -> Option<String> {
        if self.failed_sources.is_empty() {
            None
        } else {
            Some(format!("Some sources failed: {}", self.failed_sources.join(", ")))
        }
    }
}

fn to_records(items: &[NewsItem]) -> Vec<SnapshotRecord> {
    items.iter().map(NewsItem::to_snapshot_record).collect()
}

/// Run one refresh at time `now`.
///
/// Source failures and a failed snapshot write are both reported in the
/// result; the ranked view is delivered either way.
#[instrument(level = "info", skip_all, fields(sources = config.sources.len()))]
pub async fn refresh_at<T: FeedTransport>(
    transport: &T,
    config: &FeedConfig,
    store: &SharedStore,
    now: DateTime<Utc>,
) -> RefreshReport {
    let outcome = fetch_all(transport, &config.sources, config.fetch_timeout).await;
    let items = aggregate_at(&outcome, now);

    if !outcome.failed_sources.is_empty() {
        warn!(failed = %outcome.failed_sources.join(", "), "Some sources failed");
    }

    let today = date_key(now);
    let current = store.snapshot().await;
    let (snapshot_written, snapshot_error) = if should_snapshot(&current, &today, &items) {
        match store.store_snapshot(&today, to_records(&items), false).await {
            Ok(written) => (written, None),
            Err(e) => {
                error!(date_key = %today, error = %e, "Failed to save today's snapshot");
                (false, Some(e))
            }
        }
    } else {
        (false, None)
    };

    info!(
        items = items.len(),
        failed = outcome.failed_sources.len(),
        snapshot_written,
        "Refresh complete"
    );
    RefreshReport {
        items,
        fetched: outcome.items,
        failed_sources: outcome.failed_sources,
        snapshot_written,
        snapshot_error,
    }
}

pub async fn refresh<T: FeedTransport>(
    transport: &T,
    config: &FeedConfig,
    store: &SharedStore,
) -> RefreshReport {
    refresh_at(transport, config, store, Utc::now()).await
}

/// Overwrite today's snapshot with `items`, bypassing the once-per-day guard.
///
/// An empty list writes nothing. Returns the date key written, if any.
#[instrument(level = "info", skip_all, fields(items = items.len()))]
pub async fn save_current_view_at(
    store: &SharedStore,
    items: &[NewsItem],
    now: DateTime<Utc>,
) -> Result<Option<String>, StoreError> {
    if items.is_empty() {
        info!("Nothing to save");
        return Ok(None);
    }
    let today = date_key(now);
    store.store_snapshot(&today, to_records(items), true).await?;
    Ok(Some(today))
}

pub async fn save_current_view(
    store: &SharedStore,
    items: &[NewsItem],
) -> Result<Option<String>, StoreError> {
    save_current_view_at(store, items, Utc::now()).await
}
