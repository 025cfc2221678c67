//! Cleanup report built from a consistency check of media files.

use chrono::{DateTime, SecondsFormat, Utc};
use mfc_client::{FileId, MediaFile};
use serde::{Deserialize, Serialize};

use crate::checker::ConsistencyResult;

/// Summary of one category's audit, serialized in camelCase for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    pub invalid_files: Vec<InvalidFileEntry>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub cleanup_needed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidFileEntry {
    pub id: FileId,
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub reason: String,
    pub category: Option<String>,
}

/// Build a report stamped with the current time.
pub fn build_report(result: &ConsistencyResult<MediaFile>, category: &str) -> CleanupReport {
    build_report_at(result, category, Utc::now())
}

/// Build a report stamped with `timestamp`.
pub fn build_report_at(
    result: &ConsistencyResult<MediaFile>,
    category: &str,
    timestamp: DateTime<Utc>,
) -> CleanupReport {
    let summary = ReportSummary {
        total: result.total(),
        valid: result.valid.len(),
        invalid: result.invalid.len(),
        cleanup_needed: result.cleanup_needed(),
    };

    let invalid_files = result
        .invalid
        .iter()
        .map(|entry| InvalidFileEntry {
            id: entry.record.id.clone(),
            url: entry.record.file_url.clone(),
            file_name: entry.record.original_name.clone(),
            reason: entry.reason.clone(),
            category: entry.record.category.clone(),
        })
        .collect();

    CleanupReport {
        category: category.to_string(),
        timestamp,
        summary,
        invalid_files,
        recommendations: recommendations(category, summary.invalid),
    }
}

fn recommendations(category: &str, invalid: usize) -> Vec<String> {
    if invalid > 0 {
        vec![
            format!("{invalid} invalid {category} file record(s) need cleanup"),
            "Purge the invalid records or ask an administrator to clean the database".to_string(),
            "After cleanup, pages no longer show broken file links".to_string(),
        ]
    } else {
        vec![
            format!("All {category} file records are valid"),
            "No cleanup needed".to_string(),
        ]
    }
}

/// Render a report for a terminal.
pub fn render_report(report: &CleanupReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        format!("{} file cleanup report", report.category),
        format!(
            "  checked at: {}",
            report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!(
            "  summary:    {} total, {} valid, {} invalid, cleanup needed: {}",
            summary.total,
            summary.valid,
            summary.invalid,
            if summary.cleanup_needed { "yes" } else { "no" }
        ),
    ];

    if !report.invalid_files.is_empty() {
        lines.push("  invalid files:".to_string());
        for (index, file) in report.invalid_files.iter().enumerate() {
            lines.push(format!(
                "    {}. ID:{} | {} | {}",
                index + 1,
                file.id,
                file.file_name.as_deref().unwrap_or("-"),
                file.reason
            ));
        }
    }

    lines.push("  recommendations:".to_string());
    for (index, rec) in report.recommendations.iter().enumerate() {
        lines.push(format!("    {}. {rec}", index + 1));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::checker::InvalidRecord;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn single_invalid_record_needs_cleanup() {
        let result = ConsistencyResult {
            valid: vec![],
            invalid: vec![InvalidRecord {
                record: MediaFile::new(9u64, "u"),
                reason: "404".into(),
            }],
        };

        let report = build_report(&result, "logo");
        assert!(report.summary.cleanup_needed);
        assert_eq!(report.summary.invalid, 1);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.invalid_files[0].id.as_str(), "9");
        assert_eq!(report.invalid_files[0].url.as_deref(), Some("u"));
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].starts_with("1 invalid logo"));
    }

    #[test]
    fn clean_category_needs_no_cleanup() {
        let result = ConsistencyResult {
            valid: vec![MediaFile::new(1u64, "a"), MediaFile::new(2u64, "b")],
            invalid: vec![],
        };

        let report = build_report_at(&result, "banner", at());
        assert_eq!(
            report.summary,
            ReportSummary {
                total: 2,
                valid: 2,
                invalid: 0,
                cleanup_needed: false
            }
        );
        assert!(report.invalid_files.is_empty());
        assert_eq!(
            report.recommendations,
            vec!["All banner file records are valid", "No cleanup needed"]
        );
    }

    #[test]
    fn serializes_camel_case() {
        let mut record = MediaFile::new(4u64, "http://x/a.png");
        record.original_name = Some("a.png".into());
        record.category = Some("logo".into());
        let result = ConsistencyResult {
            valid: vec![],
            invalid: vec![InvalidRecord {
                record,
                reason: "HTTP 404 Not Found".into(),
            }],
        };

        let json = serde_json::to_value(build_report_at(&result, "logo", at())).unwrap();
        assert_eq!(json["timestamp"], "2025-03-14T09:26:53Z");
        assert_eq!(json["summary"]["cleanupNeeded"], true);
        assert_eq!(json["invalidFiles"][0]["fileName"], "a.png");
        assert_eq!(json["invalidFiles"][0]["id"], "4");
        assert_eq!(json["invalidFiles"][0]["category"], "logo");
    }

    #[test]
    fn render_lists_invalid_files_and_recommendations() {
        let mut record = MediaFile::new(7u64, "http://x/gone.png");
        record.original_name = Some("gone.png".into());
        let result = ConsistencyResult {
            valid: vec![MediaFile::new(1u64, "http://x/ok.png")],
            invalid: vec![InvalidRecord {
                record,
                reason: "HTTP 404 Not Found".into(),
            }],
        };

        let text = render_report(&build_report_at(&result, "logo", at()));
        assert!(text.starts_with("logo file cleanup report"));
        assert!(text.contains("checked at: 2025-03-14T09:26:53Z"));
        assert!(text.contains("2 total, 1 valid, 1 invalid, cleanup needed: yes"));
        assert!(text.contains("1. ID:7 | gone.png | HTTP 404 Not Found"));
        assert!(text.contains("3. After cleanup"));
    }
}
