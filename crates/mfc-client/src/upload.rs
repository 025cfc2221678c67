//! Multipart uploads to the admin upload API.
//!
//! | Kind  | Path (relative to context) | Form fields | Timeout |
//! |-------|----------------------------|-------------|---------|
//! | Image | `/image/enhanced` | `file`, `category`, `description`, `tags` | 2 min |
//! | Video | `/video/enhanced` | `file`, `category`, `description`, `tags` | 5 min |
//! | Logo  | `/logo` | `file` | client default |
//! | Batch | `/images/batch` | `files` (repeated), `category` | 2 min |
//!
//! The backend files logos under the `logo` category on its own.

use std::fmt;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::MediaApiError;
use crate::types::FileId;

/// Per-request timeout for image uploads, single or batched.
pub const IMAGE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-request timeout for video uploads.
pub const VIDEO_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Most images the backend accepts in one batch request.
pub const BATCH_IMAGE_LIMIT: usize = 20;

/// Category the backend stores logos under.
pub const LOGO_CATEGORY: &str = "logo";

/// What an upload carries. Picks the endpoint and the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Video,
    Logo,
}

impl UploadKind {
    pub(crate) fn path(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["image", "enhanced"],
            Self::Video => &["video", "enhanced"],
            Self::Logo => &["logo"],
        }
    }

    /// Request timeout overriding the client default, if any.
    pub fn timeout(self) -> Option<Duration> {
        match self {
            Self::Image => Some(IMAGE_UPLOAD_TIMEOUT),
            Self::Video => Some(VIDEO_UPLOAD_TIMEOUT),
            Self::Logo => None,
        }
    }
}

/// File contents plus the name the server should record.
#[derive(Clone)]
pub struct UploadPart {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl fmt::Debug for UploadPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPart")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl UploadPart {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Multipart part for this file. The bytes are copied so a retried
    /// request can build its form again.
    pub(crate) fn to_part(&self) -> Result<Part, MediaApiError> {
        let part = Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        match &self.content_type {
            Some(mime) => part.mime_str(mime).map_err(|_| {
                MediaApiError::InvalidUpload(format!("invalid content type {mime:?}"))
            }),
            None => Ok(part),
        }
    }
}

/// One file to upload, with its category and optional metadata.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub kind: UploadKind,
    category: String,
    pub part: UploadPart,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl FileUpload {
    pub fn image(category: impl Into<String>, part: UploadPart) -> Self {
        Self::new(UploadKind::Image, category.into(), part)
    }

    pub fn video(category: impl Into<String>, part: UploadPart) -> Self {
        Self::new(UploadKind::Video, category.into(), part)
    }

    pub fn logo(part: UploadPart) -> Self {
        Self::new(UploadKind::Logo, LOGO_CATEGORY.to_string(), part)
    }

    fn new(kind: UploadKind, category: String, part: UploadPart) -> Self {
        Self {
            kind,
            category,
            part,
            description: None,
            tags: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Category whose listing changes once the upload lands.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn form(&self) -> Result<Form, MediaApiError> {
        if self.kind != UploadKind::Logo && self.category.trim().is_empty() {
            return Err(MediaApiError::InvalidUpload(
                "a category is required".to_string(),
            ));
        }

        let mut form = Form::new().part("file", self.part.to_part()?);
        if self.kind == UploadKind::Logo {
            return Ok(form);
        }
        form = form.text("category", self.category.clone());
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            form = form.text("description", description.to_string());
        }
        if let Some(tags) = self.tags.as_deref().filter(|t| !t.is_empty()) {
            form = form.text("tags", tags.to_string());
        }
        Ok(form)
    }
}

/// Form for `POST /images/batch`.
pub(crate) fn batch_form(category: &str, parts: &[UploadPart]) -> Result<Form, MediaApiError> {
    if category.trim().is_empty() {
        return Err(MediaApiError::InvalidUpload(
            "a category is required".to_string(),
        ));
    }
    if parts.is_empty() {
        return Err(MediaApiError::InvalidUpload("no files to upload".to_string()));
    }
    if parts.len() > BATCH_IMAGE_LIMIT {
        return Err(MediaApiError::InvalidUpload(format!(
            "at most {BATCH_IMAGE_LIMIT} images per batch, got {}",
            parts.len()
        )));
    }

    let mut form = Form::new();
    for part in parts {
        form = form.part("files", part.to_part()?);
    }
    Ok(form.text("category", category.to_string()))
}

/// A file the server accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(default)]
    pub id: Option<FileId>,
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Per-file result of a batch upload. The batch as a whole succeeds when
/// at least one file landed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpload {
    #[serde(default)]
    pub success: Vec<UploadedFile>,
    #[serde(default)]
    pub errors: Vec<BatchUploadError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadError {
    #[serde(default)]
    pub file_name: Option<String>,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> UploadPart {
        UploadPart::new(name, vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn kinds_pick_endpoint_and_timeout() {
        assert_eq!(UploadKind::Image.path(), ["image", "enhanced"]);
        assert_eq!(UploadKind::Video.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(UploadKind::Image.timeout(), Some(Duration::from_secs(120)));
        assert_eq!(UploadKind::Logo.timeout(), None);
    }

    #[test]
    fn logo_uploads_land_in_the_logo_category() {
        assert_eq!(FileUpload::logo(png("a.png")).category(), "logo");
    }

    #[test]
    fn image_without_category_is_refused() {
        let err = FileUpload::image(" ", png("a.png")).form().unwrap_err();
        assert!(matches!(err, MediaApiError::InvalidUpload(_)));
    }

    #[test]
    fn bad_content_type_is_refused() {
        let upload = FileUpload::image("logo", png("a.png").with_content_type("not a mime"));
        let err = upload.form().unwrap_err();
        assert_eq!(err.user_message(), "invalid content type \"not a mime\"");
    }

    #[test]
    fn batch_size_is_bounded() {
        let parts: Vec<_> = (0..=BATCH_IMAGE_LIMIT)
            .map(|i| png(&format!("{i}.png")))
            .collect();
        let err = batch_form("gallery", &parts).unwrap_err();
        assert!(err.to_string().contains("at most 20 images"));
        assert!(batch_form("gallery", &parts[..BATCH_IMAGE_LIMIT]).is_ok());
        assert!(batch_form("gallery", &[]).is_err());
    }

    #[test]
    fn debug_hides_file_contents() {
        let text = format!("{:?}", png("a.png"));
        assert!(text.contains("bytes: 4"));
    }

    #[test]
    fn partial_batch_result_parses() {
        let batch: BatchUpload = serde_json::from_value(serde_json::json!({
            "success": [{"fileName": "a.png", "url": "http://files.test/a.png", "fileSize": 4}],
            "errors": [{"fileName": "b.png", "error": "unsupported format"}],
            "totalCount": 2,
            "successCount": 1,
            "errorCount": 1
        }))
        .unwrap();
        assert_eq!(batch.success[0].url, "http://files.test/a.png");
        assert_eq!(batch.errors[0].error, "unsupported format");
    }
}
