//! # List Subcommand
//!
//! `mfc list <category> [--verified] [--force] [--json]`
//!
//! Prints the category's files as returned by the backend. `--verified`
//! probes every file concurrently and keeps only the reachable ones.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use mfc_audit::{filter_existing_files, ReadSource};
use mfc_client::MediaFile;

use crate::Session;

/// Arguments for the `mfc list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// File category, e.g. `logo` or `product-image`.
    pub category: String,

    /// Only show files that are reachable on the file server.
    #[arg(long)]
    pub verified: bool,

    /// Bypass the listing cache.
    #[arg(long)]
    pub force: bool,

    /// Print the files as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the list subcommand.
pub async fn run_list(args: &ListArgs, session: &Session, out: &mut dyn Write) -> Result<u8> {
    let read = session.cache.read(&args.category, args.force).await;
    if let ReadSource::Unavailable(reason) = &read.source {
        bail!("file list for {:?} is unavailable: {reason}", args.category);
    }

    let listed = read.files.len();
    let files = if args.verified {
        let probe = Arc::new(session.client.prober().clone());
        filter_existing_files(probe, read.files, MediaFile::locator).await
    } else {
        read.files
    };
    tracing::info!(category = %args.category, listed, shown = files.len(), "listed files");

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &files)?;
        writeln!(out)?;
        return Ok(0);
    }

    for file in &files {
        writeln!(
            out,
            "{}\t{}\t{}",
            file.id,
            file.display_name(),
            file.file_url.as_deref().unwrap_or("-")
        )?;
    }
    if args.verified && files.len() < listed {
        writeln!(
            out,
            "{} of {listed} file(s) in {} reachable",
            files.len(),
            args.category
        )?;
    } else {
        writeln!(out, "{} file(s) in {}", files.len(), args.category)?;
    }
    Ok(0)
}
