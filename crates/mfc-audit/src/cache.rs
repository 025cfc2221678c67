//! # Resource Cache
//!
//! Keyed, time-expiring cache of per-category file listings sitting in front
//! of a [`FileSource`].
//!
//! ## Entry lifecycle
//!
//! ```text
//! absent ──fetch──▶ fresh ──expiry elapses──▶ stale
//!   ▲                 ▲                         │
//!   │                 └──forced read/refresh────┤
//!   └───────────invalidate / upload─────────────┘
//! ```
//!
//! Staleness is computed on read against the current expiry window. No
//! background task ever touches the store.
//!
//! ## Failures
//!
//! Reads never fail. A fetch that errors, or a backend answer without a
//! usable list, yields an empty file list tagged [`ReadSource::Unavailable`]
//! so callers can tell "unknown" apart from "confirmed empty". Failed fetches
//! leave any existing entry untouched.
//!
//! ## Concurrency
//!
//! Concurrent misses for one category share a single backend fetch: the
//! first caller fetches while the others wait on a per-category gate, then
//! find the fresh entry. A category refresh takes the same gate, so a slower
//! read can never overwrite the refreshed list with an older snapshot.
//! Gates live only while someone holds or waits on them. Store locks are
//! never held across `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use mfc_client::{
    BatchUpload, FileListing, FileSource, FileUpload, MediaApiError, MediaFile, UploadPart,
    UploadedFile,
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

type Gates = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Where the files of a [`CacheRead`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    /// Served from a fresh cache entry.
    Cache,
    /// Fetched from the backend just now. An empty list is confirmed empty.
    Backend,
    /// The fetch failed or returned no usable data; the list is empty and
    /// says nothing about the backend's contents.
    Unavailable(String),
}

/// Result of a cache read or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead {
    pub files: Vec<MediaFile>,
    pub source: ReadSource,
}

impl CacheRead {
    fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            source: ReadSource::Unavailable(reason.into()),
        }
    }

    /// Whether the files reflect the backend (fresh cache or fresh fetch).
    pub fn is_known(&self) -> bool {
        !matches!(self.source, ReadSource::Unavailable(_))
    }
}

/// Diagnostic view of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub fresh: bool,
    pub age_secs: u64,
    pub age_text: String,
    pub file_count: usize,
}

struct CacheEntry {
    files: Vec<MediaFile>,
    updated_at: Instant,
}

/// Time-expiring listing cache. Construct one per composition root and
/// share it behind an `Arc`.
pub struct ResourceCache {
    source: Arc<dyn FileSource>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    expiry: RwLock<Duration>,
    in_flight: Gates,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("categories", &self.entries.read().len())
            .field("expiry", &*self.expiry.read())
            .finish()
    }
}

impl ResourceCache {
    pub fn new(source: Arc<dyn FileSource>, expiry: Duration) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            expiry: RwLock::new(expiry),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Files of `category`, from cache when fresh and `force` is false.
    /// Failures yield an empty list; use [`ResourceCache::read`] to tell
    /// them apart from an empty category.
    pub async fn get(&self, category: &str, force: bool) -> Vec<MediaFile> {
        self.read(category, force).await.files
    }

    /// Read `category`, reporting where the files came from.
    pub async fn read(&self, category: &str, force: bool) -> CacheRead {
        if !force {
            if let Some(files) = self.fresh_files(category) {
                tracing::debug!(%category, count = files.len(), "serving file list from cache");
                return CacheRead {
                    files,
                    source: ReadSource::Cache,
                };
            }
        }

        let _pass = self.enter(category).await;

        // Another caller may have filled the entry while we waited.
        if !force {
            if let Some(files) = self.fresh_files(category) {
                return CacheRead {
                    files,
                    source: ReadSource::Cache,
                };
            }
        }

        match self.source.list_by_category(category).await {
            Ok(FileListing::Files(files)) => {
                tracing::info!(%category, count = files.len(), "fetched file list");
                self.store(category, files.clone());
                CacheRead {
                    files,
                    source: ReadSource::Backend,
                }
            }
            Ok(FileListing::NoData { reason }) => {
                tracing::warn!(%category, %reason, "file list unavailable");
                CacheRead::unavailable(reason)
            }
            Err(e) => {
                tracing::error!(%category, error = %e, "failed to fetch file list");
                CacheRead::unavailable(e.to_string())
            }
        }
    }

    /// Call the backend refresh endpoint. See [`ResourceCache::refresh_detailed`].
    pub async fn refresh(&self, category: Option<&str>) -> Vec<MediaFile> {
        self.refresh_detailed(category).await.files
    }

    /// Call the backend refresh endpoint.
    ///
    /// With a category, that entry is replaced by the refreshed list. Without
    /// one, the backend refreshes everything and the whole local cache is
    /// cleared on success.
    pub async fn refresh_detailed(&self, category: Option<&str>) -> CacheRead {
        let _pass = match category {
            Some(category) => Some(self.enter(category).await),
            None => None,
        };

        match self.source.refresh(category).await {
            Ok(FileListing::Files(files)) => {
                match category {
                    Some(category) => {
                        tracing::info!(%category, count = files.len(), "refreshed file list");
                        self.store(category, files.clone());
                    }
                    None => {
                        self.entries.write().clear();
                        tracing::info!("refreshed all file lists, local cache cleared");
                    }
                }
                CacheRead {
                    files,
                    source: ReadSource::Backend,
                }
            }
            Ok(FileListing::NoData { reason }) => {
                tracing::warn!(category = ?category, %reason, "refresh returned no data");
                CacheRead::unavailable(reason)
            }
            Err(e) => {
                tracing::error!(category = ?category, error = %e, "refresh failed");
                CacheRead::unavailable(e.to_string())
            }
        }
    }

    /// Upload one file through the backend. On success the upload's
    /// category is invalidated so the next read sees the new file.
    pub async fn upload(&self, upload: &FileUpload) -> Result<UploadedFile, MediaApiError> {
        let uploaded = self.source.upload(upload).await?;
        self.invalidate_after_write(upload.category()).await;
        Ok(uploaded)
    }

    /// Upload a batch of images into `category`. The category is
    /// invalidated when at least one image landed.
    pub async fn upload_images(
        &self,
        category: &str,
        parts: &[UploadPart],
    ) -> Result<BatchUpload, MediaApiError> {
        let batch = self.source.upload_images(category, parts).await?;
        if !batch.success.is_empty() {
            self.invalidate_after_write(category).await;
        }
        Ok(batch)
    }

    /// Waits out any fetch of `category` already in flight, which would
    /// otherwise store its pre-write snapshot after the invalidation.
    async fn invalidate_after_write(&self, category: &str) {
        let _pass = self.enter(category).await;
        self.invalidate(Some(category));
    }

    /// Drop one entry, or every entry when `category` is `None`.
    pub fn invalidate(&self, category: Option<&str>) {
        let mut entries = self.entries.write();
        match category {
            Some(category) => {
                entries.remove(category);
                tracing::debug!(%category, "cache entry invalidated");
            }
            None => {
                entries.clear();
                tracing::debug!("cache cleared");
            }
        }
    }

    /// Whether `category` has an entry younger than the expiry window.
    pub fn is_fresh(&self, category: &str) -> bool {
        let expiry = *self.expiry.read();
        self.entries
            .read()
            .get(category)
            .is_some_and(|entry| entry.updated_at.elapsed() < expiry)
    }

    /// Freshness, age and size of every known entry.
    pub fn status(&self) -> BTreeMap<String, EntryStatus> {
        let expiry = *self.expiry.read();
        self.entries
            .read()
            .iter()
            .map(|(category, entry)| {
                let age = entry.updated_at.elapsed();
                let age_secs = age.as_secs();
                let status = EntryStatus {
                    fresh: age < expiry,
                    age_secs,
                    age_text: format_age(age_secs),
                    file_count: entry.files.len(),
                };
                (category.clone(), status)
            })
            .collect()
    }

    /// Change the freshness window for all later checks, existing entries
    /// included.
    pub fn set_expiry(&self, expiry: Duration) {
        *self.expiry.write() = expiry;
        tracing::info!(?expiry, "cache expiry changed");
    }

    pub fn expiry(&self) -> Duration {
        *self.expiry.read()
    }

    fn fresh_files(&self, category: &str) -> Option<Vec<MediaFile>> {
        let expiry = *self.expiry.read();
        self.entries
            .read()
            .get(category)
            .filter(|entry| entry.updated_at.elapsed() < expiry)
            .map(|entry| entry.files.clone())
    }

    fn store(&self, category: &str, files: Vec<MediaFile>) {
        self.entries.write().insert(
            category.to_string(),
            CacheEntry {
                files,
                updated_at: Instant::now(),
            },
        );
    }

    /// Wait for exclusive use of `category`'s fetch slot.
    async fn enter<'a>(&'a self, category: &'a str) -> GatePass<'a> {
        let gate = self
            .in_flight
            .lock()
            .entry(category.to_string())
            .or_default()
            .clone();
        GatePass {
            gates: &self.in_flight,
            category,
            guard: Some(gate.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn open_gates(&self) -> usize {
        self.in_flight.lock().len()
    }
}

/// Held while fetching or refreshing one category. Dropping it releases the
/// gate and removes it from the map once nobody else holds or awaits it.
struct GatePass<'a> {
    gates: &'a Gates,
    category: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut gates = self.gates.lock();
        if gates
            .get(self.category)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(self.category);
        }
    }
}

/// Bucketed age: `Ns ago`, `N min ago`, `N h ago`, `N d ago`.
pub fn format_age(age_secs: u64) -> String {
    match age_secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{} min ago", s / 60),
        s if s < 86_400 => format!("{} h ago", s / 3_600),
        s => format!("{} d ago", s / 86_400),
    }
}
