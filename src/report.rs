//! Report files
//!
//! A lab run writes three JSON reports into the output directory plus a
//! `report_index.json` that binds each of them to the SHA-256 of its JCS
//! (RFC 8785) canonical form. Readers recompute the digest from the parsed
//! JSON, so pretty-printing or key order never changes it.

use chrono::{DateTime, Utc};
use conformance_report::{TestLabResults, TestLabSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::EffectiveConfig;

pub const RESULTS_FILE: &str = "test_lab_results.json";
pub const SUMMARY_FILE: &str = "test_lab_summary.json";
pub const CONFIG_FILE: &str = "effective_config.json";
pub const INDEX_FILE: &str = "report_index.json";

/// Schema version for report_index
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier for report_index
pub const SCHEMA_ID: &str = "conformance-lab/report_index@1";

/// Errors for report operations
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JCS canonicalization error: {0}")]
    JcsError(String),

    #[error("Digest mismatch for {file}: expected {expected}, got {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// One written report and its canonical digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub file: String,
    pub jcs_sha256: String,
}

/// Index of the reports written by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIndex {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub reports: Vec<ReportEntry>,
}

impl ReportIndex {
    pub fn entry(&self, file: &str) -> Option<&ReportEntry> {
        self.reports.iter().find(|e| e.file == file)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// SHA-256 hex digest of the JCS form of `value`.
pub fn jcs_sha256(value: &Value) -> Result<String, ReportError> {
    let jcs_bytes =
        serde_json_canonicalizer::to_vec(value).map_err(|e| ReportError::JcsError(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Write `report` as pretty JSON and return its index entry.
fn write_report<T: Serialize>(
    dir: &Path,
    file: &str,
    report: &T,
) -> Result<ReportEntry, ReportError> {
    let value = serde_json::to_value(report)?;
    let digest = jcs_sha256(&value)?;
    fs::write(dir.join(file), serde_json::to_string_pretty(&value)?)?;
    Ok(ReportEntry {
        file: file.to_string(),
        jcs_sha256: digest,
    })
}

/// Write results, summary, effective config and the index into `dir`.
pub fn write_reports(
    dir: &Path,
    results: &TestLabResults,
    config: &EffectiveConfig,
) -> Result<ReportIndex, ReportError> {
    fs::create_dir_all(dir)?;

    let reports = vec![
        write_report(dir, RESULTS_FILE, results)?,
        write_report(dir, SUMMARY_FILE, &results.summary())?,
        write_report(dir, CONFIG_FILE, config)?,
    ];

    let index = ReportIndex {
        schema_version: SCHEMA_VERSION,
        schema_id: SCHEMA_ID.to_string(),
        created_at: Utc::now(),
        run_id: results.test_run_id.clone(),
        reports,
    };
    fs::write(dir.join(INDEX_FILE), serde_json::to_string_pretty(&index)?)?;

    info!(dir = %dir.display(), run_id = ?index.run_id, "reports written");
    Ok(index)
}

/// Load a results file. When a `report_index.json` sits next to it and
/// lists the file, the digest must match.
pub fn load_results(path: &Path) -> Result<TestLabResults, ReportError> {
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;

    let index_path = path
        .parent()
        .map(|p| p.join(INDEX_FILE))
        .unwrap_or_else(|| PathBuf::from(INDEX_FILE));
    if index_path.exists() {
        let index = ReportIndex::load(&index_path)?;
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(entry) = index.entry(&file) {
            let actual = jcs_sha256(&value)?;
            if actual != entry.jcs_sha256 {
                return Err(ReportError::DigestMismatch {
                    file,
                    expected: entry.jcs_sha256.clone(),
                    actual,
                });
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Human-readable summary of a lab run.
pub fn render_summary(summary: &TestLabSummary) -> String {
    let mut out = String::new();
    let passed: usize = summary
        .workbench_summaries
        .iter()
        .map(|w| w.test_pass_count)
        .sum();
    let skipped: usize = summary
        .workbench_summaries
        .iter()
        .map(|w| w.test_skipped_count)
        .sum();

    let _ = writeln!(out, "=== Conformance Test Lab Summary ===");
    if let Some(tut) = &summary.tut_name {
        let _ = writeln!(out, "Technology under test: {}", tut);
    }
    let _ = writeln!(
        out,
        "Run: {} at {}",
        summary.test_run_id.as_deref().unwrap_or("-"),
        summary.test_run_date.to_rfc3339()
    );
    let _ = writeln!(out, "Status: {}", if summary.passed() { "PASS" } else { "FAIL" });
    let _ = writeln!(
        out,
        "Test cases: {} total, {} passed, {} failed, {} skipped",
        summary.test_case_count(),
        passed,
        summary.test_failed_count(),
        skipped
    );

    for wb in &summary.workbench_summaries {
        let mark = if wb.test_failed_count == 0 { "✓" } else { "✗" };
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  {} {} {} ({}/{} passed){}",
            mark,
            wb.workbench_name,
            wb.version_number,
            wb.test_pass_count,
            wb.test_case_count,
            if wb.workbench_complete { "" } else { " [incomplete]" }
        );
        for profile in &wb.profile_summaries {
            let _ = writeln!(
                out,
                "      {} ({}): {}",
                profile.name, profile.profile_priority, profile.conformance_status
            );
        }
        for tc in &wb.failed_test_cases {
            let _ = writeln!(out, "      ✗ {} {}", tc.test_case_id, tc.test_case_name);
        }
    }
    out
}
