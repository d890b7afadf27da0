//! Rolling store of daily snapshots.
//!
//! The store maps a date key (`YYYY-MM-DD`) to the compact records captured
//! that day and never holds more than [`MAX_SNAPSHOTS`] days. Because ISO date
//! keys sort lexicographically in chronological order, eviction simply keeps
//! the largest keys.
//!
//! # Layers
//!
//! - [`SnapshotStore`]: the in-memory value, with pure `merge`/`seed_from`
//! - [`SnapshotFile`]: persistence of the whole store as one JSON document
//! - [`SharedStore`]: a `SnapshotFile` behind a mutex, so each
//!   load → merge → save sequence runs as a single critical section
//!
//! # On-disk format
//!
//! ```text
//! {
//!   "2025-05-06": [ {"title": …, "link": …, "source": …, "time": …, "summary": …} ],
//!   "2025-05-05": [ … ]
//! }
//! ```
//!
//! Reading is fail-open (missing or corrupt data is an empty store). Writing is
//! not: a failed save is returned to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::models::SnapshotRecord;

/// Maximum number of days kept in the store.
pub const MAX_SNAPSHOTS: usize = 14;

/// Snapshots keyed by date, newest key last in iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotStore {
    snapshots: BTreeMap<String, Vec<SnapshotRecord>>,
}

impl SnapshotStore {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn contains(&self, date_key: &str) -> bool {
        self.snapshots.contains_key(date_key)
    }

    pub fn get(&self, date_key: &str) -> Option<&[SnapshotRecord]> {
        self.snapshots.get(date_key).map(Vec::as_slice)
    }

    /// Date keys, most recent first.
    pub fn keys_newest_first(&self) -> Vec<&str> {
        self.snapshots.keys().rev().map(String::as_str).collect()
    }

    /// Union with `incoming` (incoming wins on collision), then keep the
    /// [`MAX_SNAPSHOTS`] most recent keys.
    pub fn merge(mut self, incoming: BTreeMap<String, Vec<SnapshotRecord>>) -> Self {
        self.snapshots.extend(incoming);
        while self.snapshots.len() > MAX_SNAPSHOTS {
            if let Some((evicted, _)) = self.snapshots.pop_first() {
                debug!(date_key = %evicted, "Evicted snapshot");
            }
        }
        self
    }

    /// One-time bootstrap: merge `external` only if this store holds nothing.
    pub fn seed_from(self, external: BTreeMap<String, Vec<SnapshotRecord>>) -> Self {
        if !self.is_empty() {
            return self;
        }
        self.merge(external)
    }
}

/// Persistence handle for a [`SnapshotStore`] kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted store. Missing, unreadable, or corrupt data yields
    /// an empty store.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> SnapshotStore {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot store yet");
                return SnapshotStore::default();
            }
            Err(e) => {
                warn!(error = %e, "Snapshot store unreadable; treating as empty");
                return SnapshotStore::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Snapshot store corrupt; treating as empty");
                SnapshotStore::default()
            }
        }
    }

    /// Replace the persisted store with `store`.
    ///
    /// The document is written to a sibling temp file and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the directory cannot be created or the
    /// file cannot be written.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), days = store.len()))]
    pub async fn save(&self, store: &SnapshotStore) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(store)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(write_err)?;
        fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        info!("Saved snapshot store");
        Ok(())
    }
}

/// A [`SnapshotFile`] shared between concurrent callers.
///
/// Every operation holds the lock across its whole read-modify-write, so two
/// overlapping refreshes cannot drop each other's snapshot.
#[derive(Debug)]
pub struct SharedStore {
    file: Mutex<SnapshotFile>,
}

impl SharedStore {
    pub fn new(file: SnapshotFile) -> Self {
        Self {
            file: Mutex::new(file),
        }
    }

    /// Current persisted contents.
    pub async fn snapshot(&self) -> SnapshotStore {
        let file = self.file.lock().await;
        file.load().await
    }

    /// Store `records` under `date_key`.
    ///
    /// Without `overwrite` an existing key is left alone. Returns whether
    /// anything was written.
    pub async fn store_snapshot(
        &self,
        date_key: &str,
        records: Vec<SnapshotRecord>,
        overwrite: bool,
    ) -> Result<bool, StoreError> {
        let file = self.file.lock().await;
        let current = file.load().await;
        if !overwrite && current.contains(date_key) {
            debug!(%date_key, "Snapshot already present");
            return Ok(false);
        }
        let count = records.len();
        let merged = current.merge(BTreeMap::from([(date_key.to_string(), records)]));
        file.save(&merged).await?;
        info!(%date_key, count, overwrite, "Stored snapshot");
        Ok(true)
    }

    /// Seed an empty store from external snapshots. Returns whether anything
    /// was written.
    pub async fn seed_from(
        &self,
        external: BTreeMap<String, Vec<SnapshotRecord>>,
    ) -> Result<bool, StoreError> {
        let file = self.file.lock().await;
        let current = file.load().await;
        if !current.is_empty() {
            debug!(days = current.len(), "Store already populated; skipping seed");
            return Ok(false);
        }
        let seeded = current.seed_from(external);
        if seeded.is_empty() {
            return Ok(false);
        }
        file.save(&seeded).await?;
        info!(days = seeded.len(), "Seeded snapshot store");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> SnapshotRecord {
        SnapshotRecord {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            source: "S".to_string(),
            time: "2025-05-06 08:30".to_string(),
            summary: String::new(),
        }
    }

    fn day(n: u32) -> String {
        format!("2025-01-{n:02}")
    }

    fn one(key: &str, title: &str) -> BTreeMap<String, Vec<SnapshotRecord>> {
        BTreeMap::from([(key.to_string(), vec![record(title)])])
    }

    #[test]
    fn test_merge_is_right_biased() {
        let store = SnapshotStore::default().merge(one("2025-01-01", "old"));
        let store = store.merge(one("2025-01-01", "new"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("2025-01-01").unwrap()[0].title, "new");
    }

    #[test]
    fn test_merge_keeps_fourteen_most_recent_keys() {
        let mut store = SnapshotStore::default();
        for n in 1..=20 {
            store = store.merge(one(&day(n), "x"));
        }
        assert_eq!(store.len(), MAX_SNAPSHOTS);
        let expected: Vec<String> = (7..=20).rev().map(day).collect();
        assert_eq!(store.keys_newest_first(), expected);
    }

    #[test]
    fn test_merging_an_older_day_into_a_full_store_drops_it() {
        let mut store = SnapshotStore::default();
        for n in 10..24 {
            store = store.merge(one(&day(n), "x"));
        }
        let store = store.merge(one(&day(1), "ancient"));
        assert_eq!(store.len(), MAX_SNAPSHOTS);
        assert!(!store.contains(&day(1)));
    }

    #[test]
    fn test_seed_applies_only_to_empty_store() {
        let external = one("2025-01-02", "seed");
        let seeded = SnapshotStore::default().seed_from(external.clone());
        assert!(seeded.contains("2025-01-02"));

        let local = SnapshotStore::default().merge(one("2025-01-01", "local"));
        let unchanged = local.clone().seed_from(external);
        assert_eq!(unchanged, local);
    }

    #[test]
    fn test_seed_is_capped() {
        let external: BTreeMap<_, _> = (1..=20).map(|n| (day(n), vec![record("s")])).collect();
        let seeded = SnapshotStore::default().seed_from(external);
        assert_eq!(seeded.len(), MAX_SNAPSHOTS);
        assert_eq!(seeded.keys_newest_first()[0], day(20));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(tmp.path().join("none.json"));
        assert!(file.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(SnapshotFile::new(&path).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("store.json");
        let file = SnapshotFile::new(&path);
        let store = SnapshotStore::default()
            .merge(one("2025-01-01", "a"))
            .merge(one("2025-01-02", "b"));
        file.save(&store).await.unwrap();
        assert_eq!(file.load().await, store);

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["2025-01-02"][0]["title"], "b");
        assert_eq!(value["2025-01-02"][0]["time"], "2025-05-06 08:30");
    }

    #[tokio::test]
    async fn test_save_failure_is_returned() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        tokio::fs::write(&blocker, "file, not a dir").await.unwrap();
        let file = SnapshotFile::new(blocker.join("store.json"));
        let err = file.save(&SnapshotStore::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn test_automatic_snapshot_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = SharedStore::new(SnapshotFile::new(tmp.path().join("store.json")));

        assert!(shared.store_snapshot("2025-01-01", vec![record("first")], false).await.unwrap());
        assert!(!shared.store_snapshot("2025-01-01", vec![record("second")], false).await.unwrap());
        assert_eq!(shared.snapshot().await.get("2025-01-01").unwrap()[0].title, "first");

        assert!(shared.store_snapshot("2025-01-01", vec![record("manual")], true).await.unwrap());
        assert_eq!(shared.snapshot().await.get("2025-01-01").unwrap()[0].title, "manual");
    }

    #[tokio::test]
    async fn test_concurrent_writers_both_land() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = SharedStore::new(SnapshotFile::new(tmp.path().join("store.json")));
        let (a, b) = tokio::join!(
            shared.store_snapshot("2025-01-01", vec![record("a")], false),
            shared.store_snapshot("2025-01-02", vec![record("b")], false),
        );
        assert!(a.unwrap() && b.unwrap());
        let store = shared.snapshot().await;
        assert!(store.contains("2025-01-01"));
        assert!(store.contains("2025-01-02"));
    }

    #[tokio::test]
    async fn test_shared_seed_skips_populated_store() {
        let tmp = tempfile::tempdir().unwrap();
        let shared = SharedStore::new(SnapshotFile::new(tmp.path().join("store.json")));
        assert!(shared.seed_from(one("2025-01-05", "seed")).await.unwrap());
        assert!(!shared.seed_from(one("2025-01-06", "again")).await.unwrap());
        let store = shared.snapshot().await;
        assert_eq!(store.keys_newest_first(), vec!["2025-01-05"]);
    }
}
