//! Typed client for the admin upload API (listings, uploads and deletion).
//!
//! Base URL: `MFC_API_BASE_URL`
//! Context path: `/api/admin/upload`
//!
//! | Method | Path (relative to context) | Operation |
//! |--------|---------------------------|-----------|
//! | GET    | `/files/category/{category}` | List files in a category |
//! | GET    | `/files/refresh?category=` | Refresh listing (category optional) |
//! | GET    | `/file/category/{category}/latest` | Newest file in a category |
//! | GET    | `/file/exists?fileUrl=` | Server-side existence check |
//! | DELETE | `/file?fileUrl=` | Delete a stored file and its record |
//! | POST   | `/image/enhanced`, `/video/enhanced`, `/logo` | Upload one file |
//! | POST   | `/images/batch` | Upload up to 20 images |
//!
//! HTTP error statuses become [`MediaApiError::ApiError`] and are not retried
//! here; wrap calls in [`crate::retry::with_retry`] where a retry is wanted.

use async_trait::async_trait;
use url::Url;

use crate::error::MediaApiError;
use crate::types::{ApiEnvelope, FileListing, MediaFile};
use crate::upload::{
    batch_form, BatchUpload, FileUpload, UploadPart, UploadedFile, IMAGE_UPLOAD_TIMEOUT,
};

/// Path segments of the upload API context.
const API_PREFIX: &[&str] = &["api", "admin", "upload"];

/// Listing backend used by the cache and the purge step.
///
/// Implemented by [`FileClient`]; tests substitute in-memory doubles.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Current file list for `category`.
    async fn list_by_category(&self, category: &str) -> Result<FileListing, MediaApiError>;

    /// Ask the backend to refresh its listing. Without a category the
    /// backend refreshes everything and a success carries no files.
    async fn refresh(&self, category: Option<&str>) -> Result<FileListing, MediaApiError>;

    /// Delete the stored file behind `file_url`.
    async fn delete(&self, file_url: &str) -> Result<(), MediaApiError>;

    /// Store one new file.
    async fn upload(&self, upload: &FileUpload) -> Result<UploadedFile, MediaApiError>;

    /// Store several images under one category in a single request.
    async fn upload_images(
        &self,
        category: &str,
        parts: &[UploadPart],
    ) -> Result<BatchUpload, MediaApiError>;
}

/// Client for the admin upload API.
#[derive(Debug, Clone)]
pub struct FileClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FileClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// List the files of one category.
    ///
    /// Calls `GET {base_url}/api/admin/upload/files/category/{category}`.
    pub async fn list_by_category(&self, category: &str) -> Result<FileListing, MediaApiError> {
        let endpoint = format!("GET /files/category/{category}");
        let url = self.url(&["files", "category", category]);

        tracing::debug!(%url, "listing files");
        let resp = self.http.get(url).send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        Ok(read_envelope(resp, &endpoint).await?.into_listing())
    }

    /// Refresh the listing for one category, or for all of them.
    ///
    /// Calls `GET {base_url}/api/admin/upload/files/refresh[?category=]`.
    pub async fn refresh(&self, category: Option<&str>) -> Result<FileListing, MediaApiError> {
        let endpoint = "GET /files/refresh".to_string();
        let mut url = self.url(&["files", "refresh"]);
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }

        tracing::debug!(%url, "refreshing file listing");
        let resp = self.http.get(url).send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        if category.is_none() && envelope.is_success() {
            // A global refresh answers with a summary rather than a file list.
            return Ok(match envelope.into_listing() {
                FileListing::NoData { .. } => FileListing::Files(Vec::new()),
                listing => listing,
            });
        }
        Ok(envelope.into_listing())
    }

    /// Newest file of a category, `None` when the backend has none.
    ///
    /// Calls `GET {base_url}/api/admin/upload/file/category/{category}/latest`.
    pub async fn latest_by_category(
        &self,
        category: &str,
    ) -> Result<Option<MediaFile>, MediaApiError> {
        let endpoint = format!("GET /file/category/{category}/latest");
        let url = self.url(&["file", "category", category, "latest"]);

        let resp = self.http.get(url).send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        if !envelope.is_success() {
            return Ok(None);
        }
        match envelope.data.map(serde_json::from_value::<MediaFile>) {
            Some(Ok(file)) => Ok(Some(file)),
            Some(Err(e)) => {
                tracing::warn!(%category, "latest file record is malformed: {e}");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Ask the backend whether it still holds the file behind `file_url`.
    ///
    /// Calls `GET {base_url}/api/admin/upload/file/exists?fileUrl=`.
    pub async fn exists_on_server(&self, file_url: &str) -> Result<bool, MediaApiError> {
        let endpoint = "GET /file/exists".to_string();
        let mut url = self.url(&["file", "exists"]);
        url.query_pairs_mut().append_pair("fileUrl", file_url);

        let resp = self.http.get(url).send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        if !envelope.is_success() {
            return Err(rejected(endpoint, envelope));
        }
        Ok(matches!(envelope.data, Some(serde_json::Value::Bool(true))))
    }

    /// Delete a stored file by its locator.
    ///
    /// Calls `DELETE {base_url}/api/admin/upload/file?fileUrl=`.
    pub async fn delete(&self, file_url: &str) -> Result<(), MediaApiError> {
        let endpoint = "DELETE /file".to_string();
        let mut url = self.url(&["file"]);
        url.query_pairs_mut().append_pair("fileUrl", file_url);

        tracing::info!(%file_url, "deleting file");
        let resp = self.http.delete(url).send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        if !envelope.is_success() {
            return Err(rejected(endpoint, envelope));
        }
        Ok(())
    }

    /// Upload one file as multipart form data.
    ///
    /// Calls `POST {base_url}/api/admin/upload/{image/enhanced|video/enhanced|logo}`
    /// with the kind's own timeout.
    pub async fn upload(&self, upload: &FileUpload) -> Result<UploadedFile, MediaApiError> {
        let path = upload.kind.path();
        let endpoint = format!("POST /{}", path.join("/"));
        let mut request = self.http.post(self.url(path)).multipart(upload.form()?);
        if let Some(timeout) = upload.kind.timeout() {
            request = request.timeout(timeout);
        }

        tracing::info!(
            kind = ?upload.kind,
            category = upload.category(),
            file = %upload.part.file_name,
            bytes = upload.part.bytes.len(),
            "uploading file"
        );
        let resp = request.send().await.map_err(|e| MediaApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        decode_data(endpoint, envelope)
    }

    /// Upload up to [`crate::upload::BATCH_IMAGE_LIMIT`] images in one request.
    ///
    /// Calls `POST {base_url}/api/admin/upload/images/batch`. The server
    /// rejects the whole batch only when every file failed.
    pub async fn upload_images(
        &self,
        category: &str,
        parts: &[UploadPart],
    ) -> Result<BatchUpload, MediaApiError> {
        let endpoint = "POST /images/batch".to_string();
        let form = batch_form(category, parts)?;

        tracing::info!(%category, count = parts.len(), "uploading image batch");
        let resp = self
            .http
            .post(self.url(&["images", "batch"]))
            .multipart(form)
            .timeout(IMAGE_UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| MediaApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let envelope = read_envelope(resp, &endpoint).await?;
        decode_data(endpoint, envelope)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Only cannot-be-a-base URLs (mailto:, data:) refuse path segments,
        // and the config parser only yields http(s) bases.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX.iter().chain(segments));
        }
        url
    }
}

#[async_trait]
impl FileSource for FileClient {
    async fn list_by_category(&self, category: &str) -> Result<FileListing, MediaApiError> {
        FileClient::list_by_category(self, category).await
    }

    async fn refresh(&self, category: Option<&str>) -> Result<FileListing, MediaApiError> {
        FileClient::refresh(self, category).await
    }

    async fn delete(&self, file_url: &str) -> Result<(), MediaApiError> {
        FileClient::delete(self, file_url).await
    }

    async fn upload(&self, upload: &FileUpload) -> Result<UploadedFile, MediaApiError> {
        FileClient::upload(self, upload).await
    }

    async fn upload_images(
        &self,
        category: &str,
        parts: &[UploadPart],
    ) -> Result<BatchUpload, MediaApiError> {
        FileClient::upload_images(self, category, parts).await
    }
}

async fn read_envelope(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<ApiEnvelope, MediaApiError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(MediaApiError::ApiError {
            endpoint: endpoint.into(),
            status,
            body,
        });
    }

    resp.json().await.map_err(|e| MediaApiError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}

/// The `data` of a successful envelope, decoded as `T`.
fn decode_data<T: serde::de::DeserializeOwned>(
    endpoint: String,
    envelope: ApiEnvelope,
) -> Result<T, MediaApiError> {
    if !envelope.is_success() {
        return Err(rejected(endpoint, envelope));
    }
    let data = envelope.data.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(data).map_err(|source| MediaApiError::Payload { endpoint, source })
}

fn rejected(endpoint: String, envelope: ApiEnvelope) -> MediaApiError {
    MediaApiError::Rejected {
        endpoint,
        code: envelope.code,
        message: envelope.message.unwrap_or_default(),
    }
}
