//! Media API client error types.

/// Errors from media API calls.
#[derive(Debug, thiserror::Error)]
pub enum MediaApiError {
    /// HTTP transport error (connection refused, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The media API returned a non-2xx status.
    #[error("media API {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body was not the expected JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response envelope was well-formed but reported failure.
    #[error("media API {endpoint} rejected the request (code {code:?}): {message}")]
    Rejected {
        endpoint: String,
        code: Option<i64>,
        message: String,
    },
    /// The response envelope succeeded but its `data` had the wrong shape.
    #[error("unexpected data from {endpoint}: {source}")]
    Payload {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The upload was refused before anything was sent.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl MediaApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Http { source, .. } | Self::Deserialization { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    /// Whether the failure is plausibly transient: transport errors and
    /// gateway-class statuses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::ApiError { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Short message suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { .. } => "network error, check the connection".to_string(),
            Self::ApiError { status, .. } => match status {
                400 => "invalid request parameters".to_string(),
                401 => "session expired, log in again".to_string(),
                403 => "insufficient permissions, contact an administrator".to_string(),
                404 => "file does not exist or was already deleted".to_string(),
                500 => "server error, retry later".to_string(),
                502..=504 => "server temporarily unavailable, retry later".to_string(),
                other => format!("request failed with HTTP {other}"),
            },
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            Self::Rejected { .. } => "request rejected by the server".to_string(),
            Self::Deserialization { .. } | Self::Payload { .. } => {
                "unexpected response from the server".to_string()
            }
            Self::InvalidUpload(reason) => reason.clone(),
            Self::Config(e) => e.to_string(),
        }
    }
}
