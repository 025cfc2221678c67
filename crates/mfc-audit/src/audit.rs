//! One-shot audit of a category: forced listing, sequential existence check
//! on every file URL, cleanup report.

use mfc_client::{ExistenceProbe, MediaFile};

use crate::cache::{ReadSource, ResourceCache};
use crate::checker::{check_consistency_with_progress, ConsistencyResult};
use crate::report::{build_report, CleanupReport};

/// Errors from [`audit_category`].
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The listing could not be fetched, so nothing can be audited.
    #[error("file list for {category:?} is unavailable: {reason}")]
    ListingUnavailable { category: String, reason: String },
}

/// Outcome of auditing one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAudit {
    pub report: CleanupReport,
    /// Full partition, for purging the invalid records.
    pub result: ConsistencyResult<MediaFile>,
}

/// Audit `category` against the live file server.
///
/// The listing is always re-fetched; a stale cache entry would audit files
/// the backend may already have dropped.
pub async fn audit_category(
    cache: &ResourceCache,
    probe: &dyn ExistenceProbe,
    category: &str,
) -> Result<CategoryAudit, AuditError> {
    let read = cache.read(category, true).await;
    if let ReadSource::Unavailable(reason) = read.source {
        return Err(AuditError::ListingUnavailable {
            category: category.to_string(),
            reason,
        });
    }

    tracing::info!(%category, files = read.files.len(), "auditing category");
    let result = check_consistency_with_progress(probe, read.files, MediaFile::locator, |p| {
        tracing::info!(
            %category,
            "progress {}/{}, valid {}, invalid {}",
            p.processed,
            p.total,
            p.valid,
            p.invalid
        );
    })
    .await;

    Ok(CategoryAudit {
        report: build_report(&result, category),
        result,
    })
}
