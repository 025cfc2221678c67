//! # Audit Subcommand
//!
//! `mfc audit <category>... [--json] [--purge]`
//!
//! Re-fetches each category's listing, probes every file one at a time and
//! prints a cleanup report. With `--purge`, records whose file is missing
//! are deleted through the admin API.
//!
//! Exits 1 when any category could not be audited, or still needs cleanup
//! afterwards.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use mfc_audit::{audit_category, purge_invalid, render_report};
use mfc_client::RetryPolicy;

use crate::Session;

/// Arguments for the `mfc audit` subcommand.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Categories to audit.
    #[arg(required = true)]
    pub categories: Vec<String>,

    /// Print the reports as a JSON array.
    #[arg(long)]
    pub json: bool,

    /// Delete records whose file is missing.
    #[arg(long)]
    pub purge: bool,

    /// Attempts per deletion when purging.
    #[arg(long, default_value_t = mfc_client::retry::DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,

    /// Delay before the second deletion attempt, doubled after each failure.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,
}

impl AuditArgs {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Execute the audit subcommand.
pub async fn run_audit(args: &AuditArgs, session: &Session, out: &mut dyn Write) -> Result<u8> {
    let policy = args.retry_policy();
    let mut reports = Vec::with_capacity(args.categories.len());
    let mut problems = false;

    for category in &args.categories {
        let audit = match audit_category(&session.cache, session.client.prober(), category).await {
            Ok(audit) => audit,
            Err(e) => {
                tracing::error!("{e}");
                if !args.json {
                    writeln!(out, "{category}: audit skipped, {e}\n")?;
                }
                problems = true;
                continue;
            }
        };

        if !args.json {
            writeln!(out, "{}\n", render_report(&audit.report))?;
        }

        if audit.report.summary.cleanup_needed {
            if args.purge {
                let outcome =
                    purge_invalid(session.client.files(), &audit.result.invalid, &policy).await;
                session.cache.invalidate(Some(category));
                if !args.json {
                    writeln!(
                        out,
                        "{category}: purged {} of {} invalid record(s)",
                        outcome.deleted.len(),
                        audit.result.invalid.len()
                    )?;
                    for failure in &outcome.failed {
                        writeln!(out, "  failed ID:{} | {}", failure.id, failure.error)?;
                    }
                    writeln!(out)?;
                }
                problems |= !outcome.is_complete();
            } else {
                problems = true;
            }
        }

        reports.push(audit.report);
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    }
    Ok(u8::from(problems))
}
