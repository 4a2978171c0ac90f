//! Test-lab reports spanning every workbench run against one technology.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::test_case::TestCaseSummary;
use crate::workbench::{WorkbenchResults, WorkbenchSummary};

/// Full nested results of a test lab run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLabResults {
    pub test_run_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tut_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workbench_results: Vec<WorkbenchResults>,
}

impl TestLabResults {
    /// Summarize without re-querying the work pads.
    pub fn summary(&self) -> TestLabSummary {
        TestLabSummary {
            test_run_date: self.test_run_date,
            test_run_id: self.test_run_id.clone(),
            tut_name: self.tut_name.clone(),
            workbench_summaries: self
                .workbench_results
                .iter()
                .map(|wb| WorkbenchSummary {
                    workbench_id: wb.workbench_id.clone(),
                    workbench_name: wb.workbench_name.clone(),
                    version_number: wb.version_number.clone(),
                    workbench_documentation_url: wb.workbench_documentation_url.clone(),
                    workbench_complete: wb.workbench_complete,
                    test_case_count: wb.test_case_count(),
                    test_pass_count: wb.passed_test_cases.len(),
                    test_failed_count: wb.failed_test_cases.len(),
                    test_skipped_count: wb.skipped_test_cases.len(),
                    profile_summaries: wb.profile_results.iter().map(|p| p.summary()).collect(),
                    failed_test_cases: wb
                        .failed_test_cases
                        .iter()
                        .map(|tc| tc.summary())
                        .collect::<Vec<TestCaseSummary>>(),
                })
                .collect(),
        }
    }
}

/// Summarized test lab report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestLabSummary {
    pub test_run_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tut_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workbench_summaries: Vec<WorkbenchSummary>,
}

impl TestLabSummary {
    pub fn test_case_count(&self) -> usize {
        self.workbench_summaries.iter().map(|w| w.test_case_count).sum()
    }

    pub fn test_failed_count(&self) -> usize {
        self.workbench_summaries.iter().map(|w| w.test_failed_count).sum()
    }

    /// True when no test case failed and no mandatory profile is not conformant.
    pub fn passed(&self) -> bool {
        self.workbench_summaries.iter().all(|w| {
            w.test_failed_count == 0 && !w.profile_summaries.iter().any(|p| p.is_blocking())
        })
    }

    /// Get exit code (0 = pass, 1 = fail)
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}
