//! Workbench-level report types.

use serde::{Deserialize, Serialize};

use crate::profile::{ProfileResults, ProfileSummary};
use crate::test_case::{TestCaseResult, TestCaseSummary};

/// Completion state of one workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchStatus {
    pub workbench_id: String,
    pub workbench_complete: bool,
}

/// Full results of one workbench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchResults {
    pub workbench_id: String,
    pub workbench_name: String,
    pub version_number: String,
    #[serde(rename = "workbenchDocumentationURL")]
    pub workbench_documentation_url: String,
    pub workbench_complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile_results: Vec<ProfileResults>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passed_test_cases: Vec<TestCaseResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_test_cases: Vec<TestCaseResult>,
    /// Test cases that never recorded an assertion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_test_cases: Vec<TestCaseSummary>,
}

impl WorkbenchResults {
    pub fn test_case_count(&self) -> usize {
        self.passed_test_cases.len() + self.failed_test_cases.len() + self.skipped_test_cases.len()
    }
}

/// Counts and profile summaries of one workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchSummary {
    pub workbench_id: String,
    pub workbench_name: String,
    pub version_number: String,
    #[serde(rename = "workbenchDocumentationURL")]
    pub workbench_documentation_url: String,
    pub workbench_complete: bool,
    #[serde(default)]
    pub test_case_count: usize,
    #[serde(default)]
    pub test_pass_count: usize,
    #[serde(default)]
    pub test_failed_count: usize,
    #[serde(default)]
    pub test_skipped_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile_summaries: Vec<ProfileSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_test_cases: Vec<TestCaseSummary>,
}
