//! Wire types for the media file API.
//!
//! Every admin endpoint answers with the same envelope:
//!
//! ```json
//! { "code": 200, "success": true, "message": "ok", "data": { "files": [ ... ] } }
//! ```
//!
//! `data` is sometimes the bare file array. Anything else (a failed envelope,
//! a missing `files` key, a scalar) is "no data" rather than an error, see
//! [`FileListing::NoData`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque, backend-assigned file identifier.
///
/// The backend uses numeric keys today; strings are accepted so a key
/// change on the server does not break deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for FileId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// One stored file as known to the backend.
///
/// The locator (`file_url`) is never rewritten in place; probing resolves
/// it through [`crate::origin::OriginResolver`] on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: FileId,
    #[serde(default)]
    pub file_url: Option<String>,
    /// Display name as uploaded.
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl MediaFile {
    pub fn new(id: impl Into<FileId>, file_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_url: Some(file_url.into()),
            original_name: None,
            category: None,
            file_type: None,
            mime_type: None,
            file_size: None,
            thumbnail_url: None,
        }
    }

    /// Locator accessor, usable directly as a checker locator function.
    pub fn locator(&self) -> Option<&str> {
        self.file_url.as_deref()
    }

    /// Name to show an operator: the uploaded name, else the last path segment.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.original_name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        self.file_url
            .as_deref()
            .and_then(|u| u.rsplit('/').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("unnamed")
    }
}

/// The backend's response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Business success code used by the backend.
pub const SUCCESS_CODE: i64 = 200;

impl ApiEnvelope {
    /// An explicit `success` flag wins; otherwise `code == 200`.
    pub fn is_success(&self) -> bool {
        match self.success {
            Some(flag) => flag,
            None => self.code == Some(SUCCESS_CODE),
        }
    }

    /// Interpret the envelope as a file listing.
    pub fn into_listing(self) -> FileListing {
        if !self.is_success() {
            return FileListing::NoData {
                reason: format!(
                    "unsuccessful response (code {:?}): {}",
                    self.code,
                    self.message.unwrap_or_default()
                ),
            };
        }
        let files = match self.data {
            Some(serde_json::Value::Array(items)) => serde_json::Value::Array(items),
            Some(serde_json::Value::Object(mut map)) => match map.remove("files") {
                Some(files @ serde_json::Value::Array(_)) => files,
                _ => return FileListing::NoData {
                    reason: "response data has no files array".into(),
                },
            },
            _ => {
                return FileListing::NoData {
                    reason: "response carries no data".into(),
                }
            }
        };
        match serde_json::from_value(files) {
            Ok(files) => FileListing::Files(files),
            Err(e) => FileListing::NoData {
                reason: format!("malformed file records: {e}"),
            },
        }
    }
}

/// Outcome of a listing or refresh call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum FileListing {
    /// The backend confirmed this list (possibly empty).
    Files(Vec<MediaFile>),
    /// The backend answered, but not with a usable list.
    NoData { reason: String },
}

impl FileListing {
    pub fn files(&self) -> Option<&[MediaFile]> {
        match self {
            Self::Files(files) => Some(files),
            Self::NoData { .. } => None,
        }
    }

    pub fn into_files(self) -> Vec<MediaFile> {
        match self {
            Self::Files(files) => files,
            Self::NoData { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(v: serde_json::Value) -> ApiEnvelope {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn file_id_accepts_numbers_and_strings() {
        let a: FileId = serde_json::from_value(json!(42)).unwrap();
        let b: FileId = serde_json::from_value(json!("abc-1")).unwrap();
        assert_eq!(a.as_str(), "42");
        assert_eq!(b.to_string(), "abc-1");
        assert_eq!(serde_json::to_value(&a).unwrap(), json!("42"));
    }

    #[test]
    fn media_file_ignores_unknown_fields() {
        let file: MediaFile = serde_json::from_value(json!({
            "id": 7,
            "fileUrl": "http://x/a.png",
            "originalName": "a.png",
            "category": "logo",
            "storageName": "1700000000-a.png",
            "status": 1
        }))
        .unwrap();
        assert_eq!(file.id, FileId::from(7u64));
        assert_eq!(file.locator(), Some("http://x/a.png"));
        assert_eq!(file.category.as_deref(), Some("logo"));
    }

    #[test]
    fn display_name_falls_back_to_url_segment() {
        let file = MediaFile::new(1u64, "http://x/uploads/logo.png");
        assert_eq!(file.display_name(), "logo.png");
        let mut named = file.clone();
        named.original_name = Some("Company logo".into());
        assert_eq!(named.display_name(), "Company logo");
    }

    #[test]
    fn success_flag_or_code() {
        assert!(envelope(json!({"success": true})).is_success());
        assert!(envelope(json!({"code": 200})).is_success());
        assert!(!envelope(json!({"code": 500})).is_success());
        assert!(!envelope(json!({"success": false, "code": 200})).is_success());
        assert!(!envelope(json!({})).is_success());
    }

    #[test]
    fn listing_from_files_object() {
        let listing = envelope(json!({
            "code": 200,
            "data": {"files": [{"id": 1, "fileUrl": "u"}], "totalCount": 1}
        }))
        .into_listing();
        assert_eq!(listing.files().map(<[MediaFile]>::len), Some(1));
    }

    #[test]
    fn listing_from_bare_array() {
        let listing = envelope(json!({"success": true, "data": [{"id": "a"}, {"id": "b"}]}))
            .into_listing();
        assert_eq!(listing.into_files().len(), 2);
    }

    #[test]
    fn confirmed_empty_is_not_no_data() {
        let listing = envelope(json!({"code": 200, "data": {"files": []}})).into_listing();
        assert_eq!(listing, FileListing::Files(Vec::new()));
    }

    #[test]
    fn unexpected_shapes_are_no_data() {
        for v in [
            json!({"code": 500, "message": "boom"}),
            json!({"code": 200}),
            json!({"code": 200, "data": {"refreshed": true}}),
            json!({"code": 200, "data": "files"}),
            json!({"code": 200, "data": [{"fileUrl": "missing id"}]}),
        ] {
            let listing = envelope(v.clone()).into_listing();
            assert!(
                matches!(listing, FileListing::NoData { .. }),
                "expected NoData for {v}"
            );
        }
    }
}
