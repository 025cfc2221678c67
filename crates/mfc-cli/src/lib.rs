//! # mfc-cli -- Command-line front end for the media file consistency layer
//!
//! Provides the `mfc` binary.
//!
//! ## Subcommands
//!
//! - `mfc list <category>` -- Show a category's files, optionally only those
//!   whose file is still reachable.
//! - `mfc audit <category>...` -- Check every record of each category against
//!   the file server and print a cleanup report. `--purge` deletes the
//!   invalid records.
//! - `mfc probe <url>...` -- Probe individual file URLs.
//! - `mfc refresh [category]` -- Ask the backend to refresh its listing.
//! - `mfc upload <image|video|logo> <file>...` -- Upload local files and
//!   invalidate the cached listing of their category.
//!
//! Configuration comes from `MFC_*` environment variables (see
//! [`mfc_client::MediaApiConfig::from_env`]); `--base-url` and `--token`
//! override them.
//!
//! ```bash
//! mfc audit logo product-image --json
//! MFC_ORIGIN_REWRITES=http://localhost:8081=http://localhost:8080 mfc probe http://localhost:8081/uploads/a.png
//! ```
//!
//! Every handler returns the process exit code: 0 on success, 1 when the
//! command completed but found a problem (missing files, cleanup needed).

pub mod audit;
pub mod list;
pub mod probe;
pub mod refresh;
pub mod upload;

use std::sync::Arc;

use anyhow::{Context, Result};
use mfc_audit::ResourceCache;
use mfc_client::{MediaApiConfig, MediaClient};
use url::Url;
use zeroize::Zeroizing;

/// Connection overrides shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Admin API base URL. Overrides `MFC_API_BASE_URL`.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<Url>,

    /// Bearer token for the admin API. Overrides `MFC_API_TOKEN`.
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,
}

impl ConnectionArgs {
    /// Apply the overrides on top of `config`.
    pub fn apply(&self, config: &mut MediaApiConfig) {
        if let Some(url) = &self.base_url {
            config.api_base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api_token = Some(Zeroizing::new(token.clone()));
        }
    }
}

/// Client and listing cache shared by the handlers of one invocation.
#[derive(Debug)]
pub struct Session {
    pub client: MediaClient,
    pub cache: ResourceCache,
}

impl Session {
    /// Build a session from the environment plus command-line overrides.
    pub fn from_env(connection: &ConnectionArgs) -> Result<Self> {
        let mut config =
            MediaApiConfig::from_env().context("failed to load configuration from environment")?;
        connection.apply(&mut config);
        Self::new(config)
    }

    pub fn new(config: MediaApiConfig) -> Result<Self> {
        let expiry = config.cache_expiry();
        tracing::debug!(?config, "connecting to media API");
        let client = MediaClient::new(config).context("failed to build media API client")?;
        let cache = ResourceCache::new(Arc::new(client.files().clone()), expiry);
        Ok(Self { client, cache })
    }
}
