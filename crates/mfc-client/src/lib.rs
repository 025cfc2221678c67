//! # mfc-client -- Typed Rust client for the media file API
//!
//! Provides typed access to the admin upload API and to the stored files
//! themselves:
//! - **Listings** via `/api/admin/upload/files/...` ([`files::FileClient`])
//! - **Uploads** as multipart forms, with per-kind timeouts ([`upload`])
//! - **Existence probes** against each file's own locator ([`probe::Prober`])
//! - **Retry** with exponential backoff for any fallible operation
//!   ([`retry::with_retry`])
//!
//! ## Credentials
//!
//! The admin API client carries the bearer token. The prober uses a second
//! HTTP client with no default headers, so file origins never see the token.
//!
//! ## Origin resolution
//!
//! Locators stored by the backend are resolved through one
//! [`origin::OriginResolver`] before probing. Rewrites are configuration
//! (`MFC_ORIGIN_REWRITES`), not string substitution at call sites.

pub mod config;
pub mod error;
pub mod files;
pub mod origin;
pub mod probe;
pub mod retry;
pub mod types;
pub mod upload;

pub use config::MediaApiConfig;
pub use error::MediaApiError;
pub use files::{FileClient, FileSource};
pub use probe::{ExistenceProbe, ProbeOutcome, Prober};
pub use retry::{with_retry, with_retry_if, RetryPolicy};
pub use types::{FileId, FileListing, MediaFile};
pub use upload::{BatchUpload, BatchUploadError, FileUpload, UploadKind, UploadPart, UploadedFile};

/// Top-level media API client. Holds the listing client and the prober.
#[derive(Debug, Clone)]
pub struct MediaClient {
    files: FileClient,
    prober: Prober,
}

impl MediaClient {
    /// Create a new client from configuration.
    pub fn new(config: MediaApiConfig) -> Result<Self, MediaApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| MediaApiError::Config(config::ConfigError::InvalidToken))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let api_http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| MediaApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let probe_http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MediaApiError::Http {
                endpoint: "probe_client_init".into(),
                source: e,
            })?;

        Ok(Self {
            files: FileClient::new(api_http, config.api_base_url),
            prober: Prober::new(
                probe_http,
                origin::OriginResolver::new(config.file_base_url, config.origin_rewrites),
            ),
        })
    }

    /// Access the admin upload API client.
    pub fn files(&self) -> &FileClient {
        &self.files
    }

    /// Access the file existence prober.
    pub fn prober(&self) -> &Prober {
        &self.prober
    }
}
