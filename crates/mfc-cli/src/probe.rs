//! # Probe Subcommand
//!
//! `mfc probe <url>... [--json]`
//!
//! Probes each URL in order, exactly as an audit would (origin rewrites,
//! no credentials, GET fallback). Exits 1 if any file is missing.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use mfc_client::ExistenceProbe;

use crate::Session;

/// Arguments for the `mfc probe` subcommand.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// File URLs to probe.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Print one JSON object per URL.
    #[arg(long)]
    pub json: bool,
}

/// Execute the probe subcommand.
pub async fn run_probe(args: &ProbeArgs, session: &Session, out: &mut dyn Write) -> Result<u8> {
    let mut missing = 0usize;

    for url in &args.urls {
        let outcome = session.client.prober().verify(Some(url.as_str())).await;
        if !outcome.exists {
            missing += 1;
        }

        if args.json {
            let line = serde_json::json!({
                "url": url,
                "exists": outcome.exists,
                "reason": outcome.reason,
            });
            writeln!(out, "{line}")?;
        } else if outcome.exists {
            writeln!(out, "ok       {url}")?;
        } else {
            writeln!(
                out,
                "missing  {url}  ({})",
                outcome.reason.as_deref().unwrap_or("unknown")
            )?;
        }
    }

    tracing::info!(probed = args.urls.len(), missing, "probe finished");
    Ok(u8::from(missing > 0))
}
