//! Bootstrap data loading.
//!
//! The bootstrap file (`data/news.json` by default) carries a pre-built news
//! view and a set of snapshots. It is read once at start-up: its snapshots
//! seed an empty store and its items are shown until the live fetch finishes.
//! Any failure here just means "no seed available".

use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::error::SeedError;
use crate::feeds::transport::FeedTransport;
use crate::models::{BootstrapData, NewsItem};
use crate::store::SharedStore;

/// Read the bootstrap document from a local path or an http(s) URL.
///
/// # Errors
///
/// Returns a [`SeedError`] if the document cannot be read, fetched, or decoded.
#[instrument(level = "info", skip(transport))]
pub async fn read_bootstrap<T: FeedTransport>(
    transport: &T,
    location: &str,
) -> Result<BootstrapData, SeedError> {
    let raw = if location.starts_with("http://") || location.starts_with("https://") {
        transport.get_text(location).await?
    } else {
        fs::read_to_string(location)
            .await
            .map_err(|source| SeedError::Read {
                path: PathBuf::from(location),
                source,
            })?
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Read the bootstrap document, treating every failure as "no seed".
pub async fn load_bootstrap<T: FeedTransport>(transport: &T, location: &str) -> Option<BootstrapData> {
    match read_bootstrap(transport, location).await {
        Ok(data) => {
            info!(
                items = data.items.len(),
                days = data.snapshots.len(),
                "Loaded bootstrap data"
            );
            Some(data)
        }
        Err(e) => {
            warn!(%location, error = %e, "No bootstrap data; continuing without seed");
            None
        }
    }
}

/// Initial view from the bootstrap items, in file order.
pub fn seed_view(data: &BootstrapData) -> Vec<NewsItem> {
    data.items
        .iter()
        .cloned()
        .map(|item| item.into_news_item())
        .collect()
}

/// Seed `store` from the bootstrap snapshots if the store is empty.
///
/// # Errors
///
/// Returns a [`crate::error::StoreError`] if writing the seeded store fails.
pub async fn seed_store(
    store: &SharedStore,
    data: &BootstrapData,
) -> Result<bool, crate::error::StoreError> {
    if data.snapshots.is_empty() {
        return Ok(false);
    }
    store.seed_from(data.snapshots.clone()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::transport::tests::{Reply, ScriptedTransport};
    use crate::store::SnapshotFile;

    const SEED: &str = r#"{
        "generatedAt": "2025-05-06T10:00:00+00:00",
        "items": [
            {"title": "Seeded", "link": "https://s/1", "source": "S", "date": "2025-05-06T09:00:00+00:00", "summary": "hi"},
            {"title": "Undated", "link": "https://s/2", "source": "S", "summary": ""}
        ],
        "snapshots": {
            "2025-05-06": [{"title": "Seeded", "link": "https://s/1", "source": "S", "time": "2025-05-06 09:00", "summary": "hi"}]
        }
    }"#;

    #[tokio::test]
    async fn test_reads_local_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("news.json");
        tokio::fs::write(&path, SEED).await.unwrap();

        let data = load_bootstrap(&ScriptedTransport::default(), path.to_str().unwrap())
            .await
            .unwrap();
        let view = seed_view(&data);
        assert_eq!(view.len(), 2);
        assert!(view[0].published_at.is_some());
        assert!(view[1].published_at.is_none());
    }

    #[tokio::test]
    async fn test_reads_remote_file() {
        let transport = ScriptedTransport::default().with("https://host/news.json", Reply::Body(SEED.into()));
        let data = load_bootstrap(&transport, "https://host/news.json").await.unwrap();
        assert_eq!(data.snapshots.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_mean_no_seed() {
        let transport = ScriptedTransport::default().with("https://host/news.json", Reply::Status(404));
        assert!(load_bootstrap(&transport, "https://host/news.json").await.is_none());
        assert!(load_bootstrap(&transport, "/definitely/not/here.json").await.is_none());

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        tokio::fs::write(&path, "[1, 2").await.unwrap();
        let err = read_bootstrap(&transport, path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, SeedError::Decode(_)));
    }

    #[tokio::test]
    async fn test_seeds_only_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SharedStore::new(SnapshotFile::new(tmp.path().join("store.json")));
        let data: BootstrapData = serde_json::from_str(SEED).unwrap();

        assert!(seed_store(&store, &data).await.unwrap());
        assert!(!seed_store(&store, &data).await.unwrap());
        assert_eq!(store.snapshot().await.len(), 1);
    }
}
