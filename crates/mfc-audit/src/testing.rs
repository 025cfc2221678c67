//! In-memory doubles for the listing backend and the existence probe.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mfc_client::{
    BatchUpload, BatchUploadError, ExistenceProbe, FileListing, FileSource, FileUpload,
    MediaApiError, MediaFile, ProbeOutcome, UploadPart, UploadedFile,
};
use parking_lot::Mutex;

pub(crate) fn file(id: u64, name: &str) -> MediaFile {
    let mut file = MediaFile::new(id, format!("http://files.test/{name}"));
    file.original_name = Some(name.to_string());
    file.category = Some("logo".to_string());
    file
}

enum Scripted {
    Fail(String),
    NoData(String),
}

/// Scriptable [`FileSource`].
#[derive(Default)]
pub(crate) struct FakeSource {
    categories: Mutex<HashMap<String, Vec<MediaFile>>>,
    script: Mutex<VecDeque<Scripted>>,
    latency: Option<Duration>,
    list_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    delete_attempts: Mutex<HashMap<String, usize>>,
    delete_failures: Mutex<HashMap<String, (u16, usize)>>,
}

impl FakeSource {
    pub(crate) fn with_files(category: &str, names: &[&str]) -> Self {
        let source = Self::default();
        source.set_files(category, names);
        source
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn set_files(&self, category: &str, names: &[&str]) {
        let files = names
            .iter()
            .zip(1u64..)
            .map(|(name, id)| file(id, name))
            .collect();
        self.categories.lock().insert(category.to_string(), files);
    }

    pub(crate) fn fail_next(&self, message: &str) {
        self.script.lock().push_back(Scripted::Fail(message.to_string()));
    }

    pub(crate) fn no_data_next(&self, reason: &str) {
        self.script.lock().push_back(Scripted::NoData(reason.to_string()));
    }

    /// Make the next `times` deletions of `url` fail with HTTP `status`.
    pub(crate) fn fail_delete(&self, url: &str, status: u16, times: usize) {
        self.delete_failures
            .lock()
            .insert(url.to_string(), (status, times));
    }

    pub(crate) fn delete_calls(&self, url: &str) -> usize {
        self.delete_attempts.lock().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Appends `part` to `category` unless the script says otherwise.
    fn store_upload(&self, category: &str, part: &UploadPart) -> Result<UploadedFile, String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(Scripted::Fail(message)) = self.script.lock().pop_front() {
            return Err(message);
        }
        if part.file_name.starts_with("reject") {
            return Err(format!("{} refused", part.file_name));
        }
        let mut categories = self.categories.lock();
        let files = categories.entry(category.to_string()).or_default();
        let mut stored = file(files.len() as u64 + 1, &part.file_name);
        stored.category = Some(category.to_string());
        let uploaded = UploadedFile {
            id: Some(stored.id.clone()),
            url: stored.file_url.clone().unwrap_or_default(),
            file_name: Some(part.file_name.clone()),
            file_size: Some(part.bytes.len() as u64),
            thumbnail_url: None,
        };
        files.push(stored);
        Ok(uploaded)
    }

    /// Answers with the state as of the call, delivered after the latency.
    async fn answer(&self, category: Option<&str>) -> Result<FileListing, MediaApiError> {
        let scripted = self.script.lock().pop_front();
        let snapshot = match category {
            Some(category) => self
                .categories
                .lock()
                .get(category)
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match scripted {
            Some(Scripted::Fail(message)) => Err(MediaApiError::ApiError {
                endpoint: "fake".into(),
                status: 503,
                body: message,
            }),
            Some(Scripted::NoData(reason)) => Ok(FileListing::NoData { reason }),
            None => Ok(FileListing::Files(snapshot)),
        }
    }
}

#[async_trait]
impl FileSource for FakeSource {
    async fn list_by_category(&self, category: &str) -> Result<FileListing, MediaApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(Some(category)).await
    }

    async fn refresh(&self, category: Option<&str>) -> Result<FileListing, MediaApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(category).await
    }

    async fn delete(&self, file_url: &str) -> Result<(), MediaApiError> {
        *self
            .delete_attempts
            .lock()
            .entry(file_url.to_string())
            .or_default() += 1;
        {
            let mut failures = self.delete_failures.lock();
            if let Some((status, remaining)) =
                failures.get_mut(file_url).filter(|(_, n)| *n > 0)
            {
                *remaining -= 1;
                return Err(MediaApiError::ApiError {
                    endpoint: "DELETE /file".into(),
                    status: *status,
                    body: "delete failed".into(),
                });
            }
        }
        self.deleted.lock().push(file_url.to_string());
        Ok(())
    }

    /// Uploads land immediately; latency only applies to listings.
    async fn upload(&self, upload: &FileUpload) -> Result<UploadedFile, MediaApiError> {
        self.store_upload(upload.category(), &upload.part)
            .map_err(|body| MediaApiError::ApiError {
                endpoint: "POST /upload".into(),
                status: 503,
                body,
            })
    }

    async fn upload_images(
        &self,
        category: &str,
        parts: &[UploadPart],
    ) -> Result<BatchUpload, MediaApiError> {
        let mut batch = BatchUpload::default();
        for part in parts {
            match self.store_upload(category, part) {
                Ok(uploaded) => batch.success.push(uploaded),
                Err(error) => batch.errors.push(BatchUploadError {
                    file_name: Some(part.file_name.clone()),
                    error,
                }),
            }
        }
        Ok(batch)
    }
}

/// [`ExistenceProbe`] answering from a fixed set of live locators.
///
/// Unknown locators are `HTTP 404 Not Found`; the locator `panic` panics.
/// Tracks peak concurrency so tests can assert sequential probing.
#[derive(Default)]
pub(crate) struct FakeProbe {
    live: HashSet<String>,
    latency: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub(crate) fn live(locators: &[&str]) -> Self {
        Self {
            live: locators.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ExistenceProbe for FakeProbe {
    async fn verify(&self, locator: Option<&str>) -> ProbeOutcome {
        let Some(locator) = locator.filter(|l| !l.is_empty()) else {
            return ProbeOutcome::missing("missing file URL");
        };
        self.calls.lock().push(locator.to_string());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if locator == "panic" {
            panic!("probe blew up");
        }
        if self.live.contains(locator) {
            ProbeOutcome::found()
        } else {
            ProbeOutcome::missing("HTTP 404 Not Found")
        }
    }
}
