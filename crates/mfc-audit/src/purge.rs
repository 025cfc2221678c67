//! Deletion of records whose files are gone.

use mfc_client::{with_retry_if, FileId, FileSource, MediaApiError, MediaFile, RetryPolicy};

use crate::checker::InvalidRecord;

/// Result of [`purge_invalid`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurgeOutcome {
    pub deleted: Vec<FileId>,
    pub failed: Vec<PurgeFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurgeFailure {
    pub id: FileId,
    pub url: Option<String>,
    pub error: String,
}

impl PurgeOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every invalid record through `source`, one at a time, retrying
/// transient failures under `policy`. A 404 means the file is already gone
/// and counts as deleted. Records without a locator are reported as
/// failures without contacting the backend.
pub async fn purge_invalid(
    source: &dyn FileSource,
    invalid: &[InvalidRecord<MediaFile>],
    policy: &RetryPolicy,
) -> PurgeOutcome {
    let mut outcome = PurgeOutcome::default();

    for entry in invalid {
        let record = &entry.record;
        let Some(url) = record.locator().filter(|u| !u.is_empty()) else {
            tracing::warn!(id = %record.id, "cannot purge a record without a file URL");
            outcome.failed.push(PurgeFailure {
                id: record.id.clone(),
                url: None,
                error: "missing file URL".to_string(),
            });
            continue;
        };

        match with_retry_if(policy, MediaApiError::is_transient, || source.delete(url)).await {
            Ok(()) => {
                tracing::info!(id = %record.id, %url, "purged invalid file record");
                outcome.deleted.push(record.id.clone());
            }
            Err(e) if e.status() == Some(404) => {
                tracing::info!(id = %record.id, %url, "file record already gone");
                outcome.deleted.push(record.id.clone());
            }
            Err(e) => {
                tracing::error!(id = %record.id, %url, error = %e, "failed to purge file record");
                outcome.failed.push(PurgeFailure {
                    id: record.id.clone(),
                    url: Some(url.to_string()),
                    error: e.user_message(),
                });
            }
        }
    }

    tracing::info!(
        deleted = outcome.deleted.len(),
        failed = outcome.failed.len(),
        "purge finished"
    );
    outcome
}
