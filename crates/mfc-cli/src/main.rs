//! # mfc CLI entry point
//!
//! Parses command-line arguments, builds the session and dispatches to the
//! subcommand handlers. Logs go to stderr so stdout stays machine-readable.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mfc_cli::audit::{run_audit, AuditArgs};
use mfc_cli::list::{run_list, ListArgs};
use mfc_cli::probe::{run_probe, ProbeArgs};
use mfc_cli::refresh::{run_refresh, RefreshArgs};
use mfc_cli::upload::{run_upload, UploadArgs};
use mfc_cli::{ConnectionArgs, Session};

/// Media file consistency toolkit.
///
/// Lists stored files by category, audits listings against the file
/// server, purges records whose files are gone, probes individual URLs
/// and uploads new files.
#[derive(Parser, Debug)]
#[command(name = "mfc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the files of a category.
    List(ListArgs),

    /// Audit categories against the file server and report invalid records.
    Audit(AuditArgs),

    /// Probe individual file URLs.
    Probe(ProbeArgs),

    /// Ask the backend to refresh its file listing.
    Refresh(RefreshArgs),

    /// Upload image, video or logo files.
    Upload(UploadArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = match Session::from_env(&cli.connection) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::List(args) => run_list(args, &session, &mut stdout).await,
        Commands::Audit(args) => run_audit(args, &session, &mut stdout).await,
        Commands::Probe(args) => run_probe(args, &session, &mut stdout).await,
        Commands::Refresh(args) => run_refresh(args, &session, &mut stdout).await,
        Commands::Upload(args) => run_upload(args, &session, &mut stdout).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use mfc_cli::upload::MediaKind;

    use super::*;

    #[test]
    fn cli_parse_list_flags() {
        let cli = Cli::try_parse_from(["mfc", "list", "logo", "--verified", "--json"]).unwrap();
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.category, "logo");
                assert!(args.verified);
                assert!(args.json);
                assert!(!args.force);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_audit_multiple_categories() {
        let cli =
            Cli::try_parse_from(["mfc", "audit", "logo", "product-image", "--purge"]).unwrap();
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.categories, vec!["logo", "product-image"]);
                assert!(args.purge);
                assert_eq!(args.attempts, 3);
                assert_eq!(args.retry_delay_ms, 1000);
            }
            other => panic!("expected audit, got {other:?}"),
        }
    }

    #[test]
    fn cli_audit_requires_a_category() {
        assert!(Cli::try_parse_from(["mfc", "audit"]).is_err());
    }

    #[test]
    fn cli_probe_requires_a_url() {
        assert!(Cli::try_parse_from(["mfc", "probe"]).is_err());
    }

    #[test]
    fn cli_refresh_category_is_optional() {
        let cli = Cli::try_parse_from(["mfc", "refresh"]).unwrap();
        assert!(matches!(cli.command, Commands::Refresh(RefreshArgs { category: None })));
    }

    #[test]
    fn cli_parse_upload() {
        let cli = Cli::try_parse_from([
            "mfc", "upload", "video", "a.mp4", "b.mp4", "-c", "promo", "--tags", "spring",
        ])
        .unwrap();
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.kind, MediaKind::Video);
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.category.as_deref(), Some("promo"));
                assert_eq!(args.tags.as_deref(), Some("spring"));
                assert_eq!(args.attempts, 3);
            }
            other => panic!("expected upload, got {other:?}"),
        }
    }

    #[test]
    fn cli_upload_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["mfc", "upload", "audio", "a.mp3"]).is_err());
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mfc",
            "probe",
            "http://files.test/a.png",
            "-vv",
            "--base-url",
            "http://api.test:33380",
            "--token",
            "t0k",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.connection.base_url.map(|u| u.to_string()),
            Some("http://api.test:33380/".to_string())
        );
        assert_eq!(cli.connection.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn cli_rejects_invalid_base_url() {
        assert!(Cli::try_parse_from(["mfc", "--base-url", "not a url", "refresh"]).is_err());
    }
}
