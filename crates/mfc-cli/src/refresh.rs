//! # Refresh Subcommand
//!
//! `mfc refresh [category]`
//!
//! Asks the backend to refresh its file listing for one category, or for
//! all of them when no category is given.

use std::io::Write;

use anyhow::{bail, Result};
use clap::Args;
use mfc_audit::ReadSource;

use crate::Session;

/// Arguments for the `mfc refresh` subcommand.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Category to refresh. All categories when omitted.
    pub category: Option<String>,
}

/// Execute the refresh subcommand.
pub async fn run_refresh(args: &RefreshArgs, session: &Session, out: &mut dyn Write) -> Result<u8> {
    let category = args.category.as_deref();
    let read = session.cache.refresh_detailed(category).await;
    if let ReadSource::Unavailable(reason) = &read.source {
        bail!("refresh failed: {reason}");
    }

    match category {
        Some(category) => writeln!(out, "refreshed {category}: {} file(s)", read.files.len())?,
        None => writeln!(out, "refreshed all categories")?,
    }
    Ok(0)
}
