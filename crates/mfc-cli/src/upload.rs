//! # Upload Subcommand
//!
//! `mfc upload <image|video|logo> <file>... [--category C] [--json]`
//!
//! Uploads local files through the admin API. Several images go out as
//! batches of up to 20; videos and logos are sent one request per file.
//! Transient failures are retried with backoff. Exits 1 if any file was
//! not stored.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use mfc_client::upload::BATCH_IMAGE_LIMIT;
use mfc_client::{with_retry_if, FileUpload, MediaApiError, RetryPolicy, UploadPart};

use crate::Session;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Logo,
}

/// Arguments for the `mfc upload` subcommand.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Kind of media being uploaded.
    #[arg(value_enum)]
    pub kind: MediaKind,

    /// Files to upload.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Category to file the uploads under. Required for images and videos.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Free-text description stored with each file.
    #[arg(long)]
    pub description: Option<String>,

    /// Comma-separated tags stored with each file.
    #[arg(long)]
    pub tags: Option<String>,

    /// MIME type sent for every file, e.g. `image/png`.
    #[arg(long, value_name = "MIME")]
    pub content_type: Option<String>,

    /// Print one JSON object per file.
    #[arg(long)]
    pub json: bool,

    /// Attempts per request on transient failures.
    #[arg(long, default_value_t = mfc_client::retry::DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,

    /// Delay before the second attempt, doubled after each failure.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,
}

/// Per-file outcome, printed as text or JSON.
struct Uploaded {
    file: String,
    result: Result<String, String>,
}

/// Execute the upload subcommand.
pub async fn run_upload(args: &UploadArgs, session: &Session, out: &mut dyn Write) -> Result<u8> {
    let category = match (args.kind, args.category.as_deref()) {
        (MediaKind::Logo, _) if args.files.len() != 1 => {
            bail!("a logo upload takes exactly one file")
        }
        (MediaKind::Logo, _) => None,
        (_, Some(category)) if !category.trim().is_empty() => Some(category),
        (_, _) => bail!("--category is required for image and video uploads"),
    };

    let mut parts = Vec::with_capacity(args.files.len());
    for path in &args.files {
        parts.push(read_part(path, args.content_type.as_deref()).await?);
    }

    let policy = RetryPolicy::new(args.attempts, Duration::from_millis(args.retry_delay_ms));
    let results = match (args.kind, category) {
        (MediaKind::Image, Some(category)) if parts.len() > 1 => {
            upload_batches(session, &policy, category, &parts).await
        }
        (kind, category) => {
            let mut results = Vec::with_capacity(parts.len());
            for part in parts {
                let upload = build_upload(kind, category.unwrap_or_default(), part, args);
                let result = with_retry_if(&policy, MediaApiError::is_transient, || {
                    session.cache.upload(&upload)
                })
                .await;
                results.push(Uploaded {
                    file: upload.part.file_name.clone(),
                    result: result.map(|u| u.url).map_err(|e| e.user_message()),
                });
            }
            results
        }
    };

    let mut failed = 0usize;
    for uploaded in &results {
        if uploaded.result.is_err() {
            failed += 1;
        }
        if args.json {
            let line = match &uploaded.result {
                Ok(url) => serde_json::json!({"file": uploaded.file, "url": url}),
                Err(error) => serde_json::json!({"file": uploaded.file, "error": error}),
            };
            writeln!(out, "{line}")?;
        } else {
            match &uploaded.result {
                Ok(url) => writeln!(out, "uploaded {}  ->  {url}", uploaded.file)?,
                Err(error) => writeln!(out, "failed   {}  ({error})", uploaded.file)?,
            }
        }
    }

    tracing::info!(uploaded = results.len() - failed, failed, "upload finished");
    Ok(u8::from(failed > 0))
}

async fn upload_batches(
    session: &Session,
    policy: &RetryPolicy,
    category: &str,
    parts: &[UploadPart],
) -> Vec<Uploaded> {
    let mut results = Vec::with_capacity(parts.len());
    for chunk in parts.chunks(BATCH_IMAGE_LIMIT) {
        let batch = with_retry_if(policy, MediaApiError::is_transient, || {
            session.cache.upload_images(category, chunk)
        })
        .await;

        match batch {
            Ok(batch) => {
                results.extend(batch.success.into_iter().map(|u| Uploaded {
                    file: u.file_name.unwrap_or_default(),
                    result: Ok(u.url),
                }));
                results.extend(batch.errors.into_iter().map(|e| Uploaded {
                    file: e.file_name.unwrap_or_default(),
                    result: Err(e.error),
                }));
            }
            Err(e) => {
                tracing::error!(%category, error = %e, "image batch failed");
                let message = e.user_message();
                results.extend(chunk.iter().map(|part| Uploaded {
                    file: part.file_name.clone(),
                    result: Err(message.clone()),
                }));
            }
        }
    }
    results
}

fn build_upload(
    kind: MediaKind,
    category: &str,
    part: UploadPart,
    args: &UploadArgs,
) -> FileUpload {
    let mut upload = match kind {
        MediaKind::Image => FileUpload::image(category, part),
        MediaKind::Video => FileUpload::video(category, part),
        MediaKind::Logo => FileUpload::logo(part),
    };
    if let Some(description) = &args.description {
        upload = upload.with_description(description.clone());
    }
    if let Some(tags) = &args.tags {
        upload = upload.with_tags(tags.clone());
    }
    upload
}

async fn read_part(path: &Path, content_type: Option<&str>) -> Result<UploadPart> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;

    let part = UploadPart::new(file_name, bytes);
    Ok(match content_type {
        Some(mime) => part.with_content_type(mime),
        None => part,
    })
}
