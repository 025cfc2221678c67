//! # mfc-audit -- Resource consistency layer
//!
//! Sits between consumers of file listings and the media API:
//!
//! - [`cache::ResourceCache`] serves per-category listings from a
//!   time-expiring cache, with forced reads, backend refresh and
//!   invalidation. Uploads go through it so their category is invalidated.
//! - [`checker`] partitions records by whether their file still exists,
//!   either strictly sequentially (full audits) or fanned out (small lists).
//! - [`report`] turns a partition into a cleanup report.
//! - [`purge`] deletes the records whose files are gone.
//! - [`audit::audit_category`] chains a forced read, a sequential check and
//!   a report for one category.
//!
//! The listing backend ([`mfc_client::FileSource`]) and the probe
//! ([`mfc_client::ExistenceProbe`]) are injected, so every piece runs
//! against in-memory doubles in tests.

pub mod audit;
pub mod cache;
pub mod checker;
pub mod purge;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use audit::{audit_category, AuditError, CategoryAudit};
pub use cache::{CacheRead, EntryStatus, ReadSource, ResourceCache};
pub use checker::{
    check_consistency, check_consistency_with_progress, filter_existing_files, validate_file,
    ConsistencyResult, InvalidRecord, Progress, Validated,
};
pub use purge::{purge_invalid, PurgeFailure, PurgeOutcome};
pub use report::{build_report, render_report, CleanupReport, InvalidFileEntry, ReportSummary};
