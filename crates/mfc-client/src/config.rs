//! Media API client configuration.
//!
//! Configures the admin API base URL, the file-serving origin and the
//! origin rewrite rules applied before probing. Defaults point at a local
//! development backend. Override via environment variables or explicit
//! construction for staging/testing.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::origin::OriginRewrite;

/// Default cache freshness window (five minutes).
pub const DEFAULT_CACHE_EXPIRY_MS: u64 = 300_000;

/// Configuration for connecting to the media API.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct MediaApiConfig {
    /// Base URL of the admin API (listing, refresh, delete).
    /// Default: <http://localhost:33380>
    pub api_base_url: Url,
    /// Base URL used to resolve relative file locators before probing.
    pub file_base_url: Option<Url>,
    /// Origin rewrites applied to every probed locator.
    pub origin_rewrites: Vec<OriginRewrite>,
    /// Bearer token for the admin API. Never sent to file probes.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Listing cache freshness window in milliseconds.
    pub cache_expiry_ms: u64,
}

impl std::fmt::Debug for MediaApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaApiConfig")
            .field("api_base_url", &self.api_base_url)
            .field("file_base_url", &self.file_base_url)
            .field("origin_rewrites", &self.origin_rewrites)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_expiry_ms", &self.cache_expiry_ms)
            .finish()
    }
}

impl MediaApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MFC_API_BASE_URL` (default: `http://localhost:33380`)
    /// - `MFC_FILE_BASE_URL` (optional)
    /// - `MFC_ORIGIN_REWRITES` (optional, comma-separated `from=to` pairs)
    /// - `MFC_API_TOKEN` (optional)
    /// - `MFC_TIMEOUT_SECS` (default: 30)
    /// - `MFC_CACHE_EXPIRY_MS` (default: 300000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let file_base_url = match std::env::var("MFC_FILE_BASE_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_url("MFC_FILE_BASE_URL", &raw)?),
            _ => None,
        };
        let origin_rewrites = match std::env::var("MFC_ORIGIN_REWRITES") {
            Ok(raw) => parse_rewrites(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            api_base_url: env_url("MFC_API_BASE_URL", "http://localhost:33380")?,
            file_base_url,
            origin_rewrites,
            api_token: std::env::var("MFC_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            timeout_secs: env_u64("MFC_TIMEOUT_SECS", 30),
            cache_expiry_ms: env_u64("MFC_CACHE_EXPIRY_MS", DEFAULT_CACHE_EXPIRY_MS),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, token: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_url("local_mock", base_url)?,
            file_base_url: None,
            origin_rewrites: Vec::new(),
            api_token: token.map(|t| Zeroizing::new(t.to_string())),
            timeout_secs: 5,
            cache_expiry_ms: DEFAULT_CACHE_EXPIRY_MS,
        })
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache freshness window as a [`Duration`].
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_millis(self.cache_expiry_ms)
    }
}

/// Parse a comma-separated list of `from=to` origin rewrite rules.
pub fn parse_rewrites(raw: &str) -> Result<Vec<OriginRewrite>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OriginRewrite::parse)
        .collect()
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(what.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid origin rewrite {0:?}: {1}")]
    InvalidRewrite(String, String),
    #[error("MFC_API_TOKEN contains characters not allowed in an HTTP header")]
    InvalidToken,
}
