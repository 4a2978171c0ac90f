//! Per-test-case report types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::evidence::ExceptionDetail;

/// Identity of a test case, without any outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSummary {
    pub test_case_id: String,
    pub test_case_name: String,
    #[serde(rename = "testCaseDescriptionURL")]
    pub test_case_description_url: String,
}

/// Detailed outcome of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub test_case_id: String,
    pub test_case_name: String,
    #[serde(rename = "testCaseDescriptionURL")]
    pub test_case_description_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successful_assertions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsuccessful_assertions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_supported_assertions: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub discovered_properties: BTreeMap<String, serde_json::Value>,

    /// Unexpected failure captured while the test case ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conformance_exception: Option<ExceptionDetail>,

    /// Sum of the elapsed times reported by timed assertions, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<u64>,
}

impl TestCaseResult {
    /// Identity-only view of this result.
    pub fn summary(&self) -> TestCaseSummary {
        TestCaseSummary {
            test_case_id: self.test_case_id.clone(),
            test_case_name: self.test_case_name.clone(),
            test_case_description_url: self.test_case_description_url.clone(),
        }
    }

    pub fn passed(&self) -> bool {
        self.unsuccessful_assertions.is_empty() && self.conformance_exception.is_none()
    }
}
