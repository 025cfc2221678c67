//! # Consistency Checker
//!
//! Applies an [`ExistenceProbe`] to a batch of records and partitions them
//! into records whose file is reachable and records whose file is not.
//!
//! Two operations with different concurrency policies:
//!
//! - [`check_consistency`] probes strictly one record at a time, in input
//!   order. Record *i+1* is not probed until record *i* has settled, so a
//!   full audit never has more than one request outstanding against the
//!   file server.
//! - [`filter_existing_files`] fans every probe out on its own task and
//!   waits for all of them. Meant for small batches such as a single list
//!   about to be displayed.
//!
//! Records are generic; callers supply a locator function mapping a record
//! to its file URL.

use std::sync::Arc;

use mfc_client::ExistenceProbe;

/// Progress is reported after every this many records, and after the last.
pub const PROGRESS_EVERY: usize = 5;

/// A record whose file could not be confirmed, with the probe's reason.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRecord<T> {
    pub record: T,
    pub reason: String,
}

/// Partition produced by [`check_consistency`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyResult<T> {
    pub valid: Vec<T>,
    pub invalid: Vec<InvalidRecord<T>>,
}

impl<T> Default for ConsistencyResult<T> {
    fn default() -> Self {
        Self {
            valid: Vec::new(),
            invalid: Vec::new(),
        }
    }
}

impl<T> ConsistencyResult<T> {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn cleanup_needed(&self) -> bool {
        !self.invalid.is_empty()
    }
}

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// One record paired with its probe outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub record: T,
    pub exists: bool,
    pub reason: Option<String>,
}

/// Probe a single record's file.
pub async fn validate_file<T, F>(probe: &dyn ExistenceProbe, record: T, locator: F) -> Validated<T>
where
    F: Fn(&T) -> Option<&str>,
{
    let outcome = probe.verify(locator(&record)).await;
    Validated {
        record,
        exists: outcome.exists,
        reason: outcome.reason,
    }
}

/// Sequentially probe every record. See [`check_consistency_with_progress`].
pub async fn check_consistency<T, F>(
    probe: &dyn ExistenceProbe,
    records: Vec<T>,
    locator: F,
) -> ConsistencyResult<T>
where
    F: Fn(&T) -> Option<&str>,
{
    check_consistency_with_progress(probe, records, locator, |_| {}).await
}

/// Sequentially probe every record in input order, calling `on_progress`
/// every [`PROGRESS_EVERY`] records and after the final one.
///
/// Every input record lands in exactly one of `valid` or `invalid`, and
/// both keep input order.
pub async fn check_consistency_with_progress<T, F, P>(
    probe: &dyn ExistenceProbe,
    records: Vec<T>,
    locator: F,
    mut on_progress: P,
) -> ConsistencyResult<T>
where
    F: Fn(&T) -> Option<&str>,
    P: FnMut(Progress),
{
    let total = records.len();
    tracing::info!(total, "checking record consistency");

    let mut result = ConsistencyResult::default();
    for (index, record) in records.into_iter().enumerate() {
        let checked = validate_file(probe, record, &locator).await;
        if checked.exists {
            result.valid.push(checked.record);
        } else {
            let reason = checked
                .reason
                .unwrap_or_else(|| "file not accessible".to_string());
            tracing::warn!(
                locator = locator(&checked.record).unwrap_or("<none>"),
                %reason,
                "invalid file record"
            );
            result.invalid.push(InvalidRecord {
                record: checked.record,
                reason,
            });
        }

        let processed = index + 1;
        if processed % PROGRESS_EVERY == 0 || processed == total {
            let progress = Progress {
                processed,
                total,
                valid: result.valid.len(),
                invalid: result.invalid.len(),
            };
            tracing::debug!(
                processed,
                total,
                valid = progress.valid,
                invalid = progress.invalid,
                "consistency progress"
            );
            on_progress(progress);
        }
    }

    tracing::info!(
        valid = result.valid.len(),
        invalid = result.invalid.len(),
        "consistency check complete"
    );
    result
}

/// Probe every record concurrently and keep those whose file exists.
///
/// Each probe runs on its own task, so one probe panicking does not affect
/// its siblings; such a record is logged and dropped. Kept records retain
/// input order.
pub async fn filter_existing_files<T, F>(
    probe: Arc<dyn ExistenceProbe>,
    records: Vec<T>,
    locator: F,
) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&T) -> Option<&str>,
{
    let handles: Vec<_> = records
        .into_iter()
        .map(|record| {
            let target = locator(&record).map(str::to_owned);
            let probe = Arc::clone(&probe);
            tokio::spawn(async move {
                let outcome = probe.verify(target.as_deref()).await;
                (record, outcome.exists)
            })
        })
        .collect();

    let total = handles.len();
    let mut kept = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok((record, true)) => kept.push(record),
            Ok((_, false)) => {}
            Err(e) => tracing::error!(error = %e, "existence probe did not settle, dropping record"),
        }
    }

    tracing::debug!(total, kept = kept.len(), "filtered records by file existence");
    kept
}
