//! Evidence records.
//!
//! One `Evidence` value describes a single fact observed while a test case
//! ran. Evidence is append-only: once handed to a work pad it is never
//! modified.

use serde::{Deserialize, Serialize};

use crate::enums::TestEvidenceType;

/// Details of an unexpected failure raised inside a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetail {
    /// Type name of the error that escaped the test case
    pub exception_class_name: String,
    /// Error message
    pub exception_message: String,
    /// Method being exercised when the error occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl ExceptionDetail {
    pub fn new(
        exception_class_name: impl Into<String>,
        exception_message: impl Into<String>,
    ) -> Self {
        Self {
            exception_class_name: exception_class_name.into(),
            exception_message: exception_message.into(),
            method_name: None,
        }
    }

    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }
}

/// A single observation attributed to a profile and requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub profile_id: u32,
    pub requirement_id: u32,
    pub test_case_id: String,
    pub test_case_name: String,
    #[serde(rename = "testCaseDescriptionURL")]
    pub test_case_description_url: String,
    pub test_evidence_type: TestEvidenceType,
    pub assertion_id: String,
    /// Human-readable statement of what was checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    /// Elapsed time of the call under test in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionDetail>,
}

impl Evidence {
    /// Create an evidence record with no optional detail attached.
    pub fn new(
        test_evidence_type: TestEvidenceType,
        profile_id: u32,
        requirement_id: u32,
        test_case_id: impl Into<String>,
        test_case_name: impl Into<String>,
        test_case_description_url: impl Into<String>,
        assertion_id: impl Into<String>,
    ) -> Self {
        Self {
            profile_id,
            requirement_id,
            test_case_id: test_case_id.into(),
            test_case_name: test_case_name.into(),
            test_case_description_url: test_case_description_url.into(),
            test_evidence_type,
            assertion_id: assertion_id.into(),
            assertion_message: None,
            method_name: None,
            elapsed_time: None,
            property_name: None,
            property_value: None,
            exception: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.assertion_message = Some(message.into());
        self
    }

    pub fn with_method(mut self, method_name: Option<String>, elapsed_time: Option<u64>) -> Self {
        self.method_name = method_name;
        self.elapsed_time = elapsed_time;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.property_name = Some(name.into());
        self.property_value = Some(value);
        self
    }

    pub fn with_exception(mut self, exception: ExceptionDetail) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Whether this evidence belongs to the given profile.
    pub fn is_for_profile(&self, profile_id: u32) -> bool {
        self.profile_id == profile_id
    }

    /// Whether this evidence belongs to the given requirement of a profile.
    pub fn is_for_requirement(&self, profile_id: u32, requirement_id: u32) -> bool {
        self.profile_id == profile_id && self.requirement_id == requirement_id
    }
}
