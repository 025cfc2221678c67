//! File existence probing.
//!
//! A probe is a `HEAD` against the file's own locator, sent without
//! credentials and with `Cache-Control: no-cache`. Some file servers and
//! proxies drop `HEAD` at the connection level, so a transport failure on
//! the `HEAD` is retried once as a full `GET`. An HTTP status answer is
//! final: 2xx means the file exists, anything else means it does not.
//!
//! Probing never fails. Every failure path resolves to "does not exist"
//! with a reason attached.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CACHE_CONTROL};
use reqwest::{Method, StatusCode};

use crate::origin::OriginResolver;

/// Result of probing one locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub exists: bool,
    /// Why the file is considered missing. `None` when it exists.
    pub reason: Option<String>,
}

impl ProbeOutcome {
    pub fn found() -> Self {
        Self {
            exists: true,
            reason: None,
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        Self {
            exists: false,
            reason: Some(reason.into()),
        }
    }

    fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            Self::found()
        } else {
            Self::missing(status_reason(status))
        }
    }
}

/// `HTTP 404 Not Found` style description of a status.
pub fn status_reason(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(text) => format!("HTTP {} {text}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Existence check over a locator, abstracted for the consistency checker.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Probe `locator`. `None` and blank locators are missing without any
    /// network access.
    async fn verify(&self, locator: Option<&str>) -> ProbeOutcome;

    async fn verify_exists(&self, locator: Option<&str>) -> bool {
        self.verify(locator).await.exists
    }
}

/// Probes file locators over HTTP.
#[derive(Debug, Clone)]
pub struct Prober {
    http: reqwest::Client,
    origin: OriginResolver,
}

impl Prober {
    /// `http` must not carry credentials; file origins are often third
    /// parties (CDN, object storage).
    pub(crate) fn new(http: reqwest::Client, origin: OriginResolver) -> Self {
        Self { http, origin }
    }

    async fn probe(&self, method: Method, url: &url::Url) -> Result<StatusCode, reqwest::Error> {
        self.http
            .request(method, url.clone())
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await
            .map(|resp| resp.status())
    }
}

#[async_trait]
impl ExistenceProbe for Prober {
    async fn verify(&self, locator: Option<&str>) -> ProbeOutcome {
        let Some(locator) = locator.map(str::trim).filter(|l| !l.is_empty()) else {
            tracing::warn!("refusing to probe an empty file URL");
            return ProbeOutcome::missing("missing file URL");
        };

        let url = match self.origin.resolve(locator) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%locator, "invalid file URL: {e}");
                return ProbeOutcome::missing(format!("invalid file URL: {e}"));
            }
        };

        let head_err = match self.probe(Method::HEAD, &url).await {
            Ok(status) => {
                let outcome = ProbeOutcome::from_status(status);
                if let Some(reason) = &outcome.reason {
                    tracing::warn!(%url, %reason, "file not accessible");
                }
                return outcome;
            }
            Err(e) => e,
        };

        tracing::warn!(%url, "HEAD probe failed, retrying with GET: {head_err}");
        match self.probe(Method::GET, &url).await {
            Ok(status) => ProbeOutcome::from_status(status),
            Err(e) => {
                tracing::warn!(%url, "GET probe failed too: {e}");
                ProbeOutcome::missing(e.to_string())
            }
        }
    }
}
