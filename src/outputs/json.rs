//! Bootstrap data export.
//!
//! Builds the document that later runs read as their seed: the fetched items
//! of the last week plus one snapshot per UTC day.
//!
//! # Output Structure
//!
//! ```text
//! export_dir/
//! └── news.json    # {"generatedAt": …, "items": […], "snapshots": {"2025-05-06": […]}}
//! ```
//!
//! # Window
//!
//! The window is anchored on the newest item rather than the current time, so
//! an export from a quiet week still carries that week's news. Undated and
//! link-less items are left out.

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::{BootstrapData, BootstrapItem, NewsItem, SnapshotRecord};
use crate::utils::{date_key, ensure_writable_dir};

/// Days kept before the newest item.
pub const EXPORT_DAYS_BACK: i64 = 7;

pub const EXPORT_FILE_NAME: &str = "news.json";

/// Build a bootstrap document from `items`, stamped with `now`.
pub fn build_bootstrap(items: &[NewsItem], now: DateTime<Utc>) -> BootstrapData {
    let dated: Vec<(&NewsItem, DateTime<Utc>)> = items
        .iter()
        .filter(|item| !item.link.is_empty())
        .filter_map(|item| item.published_at.map(|ts| (item, ts)))
        .collect();

    let anchor = dated.iter().map(|(_, ts)| *ts).max().unwrap_or(now);
    let cutoff = anchor - Duration::days(EXPORT_DAYS_BACK);

    let kept: Vec<(&NewsItem, DateTime<Utc>)> = dated
        .into_iter()
        .filter(|(_, ts)| *ts >= cutoff)
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect();

    let mut snapshots: BTreeMap<String, Vec<SnapshotRecord>> = BTreeMap::new();
    for (key, group) in &kept.iter().chunk_by(|(_, ts)| date_key(*ts)) {
        snapshots.entry(key).or_default().extend(group.map(|(item, ts)| SnapshotRecord {
            title: item.title.clone(),
            link: item.link.clone(),
            source: item.source.clone(),
            time: ts.format("%Y-%m-%d %H:%M").to_string(),
            summary: item.summary.clone(),
        }));
    }

    BootstrapData {
        generated_at: Some(now.to_rfc3339()),
        items: kept
            .iter()
            .map(|(item, _)| BootstrapItem::from_news_item(item))
            .collect(),
        snapshots,
    }
}

/// Write `data` to `{export_dir}/news.json` and return the file path.
///
/// The directory is created and probed for writability first.
#[instrument(level = "info", skip_all, fields(export_dir = %export_dir.display()))]
pub async fn write_bootstrap(
    data: &BootstrapData,
    export_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    if let Err(e) = ensure_writable_dir(export_dir).await {
        error!(error = %e, "Export directory is not writable");
        return Err(e.into());
    }

    let json = serde_json::to_string_pretty(data)?;
    let path = export_dir.join(EXPORT_FILE_NAME);
    fs::write(&path, json).await?;
    info!(
        path = %path.display(),
        items = data.items.len(),
        days = data.snapshots.len(),
        "Wrote bootstrap data"
    );
    Ok(path)
}
