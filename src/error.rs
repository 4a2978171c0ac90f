//! Error code registry for workbench setup and report lookups.
//!
//! Assertion failures are not errors at this level: they are recorded as
//! evidence and absorbed by the test case. Only wiring defects and bad lookups
//! surface here.

/// Stable error codes for automation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Two test cases registered with the same id on one work pad
    DuplicateTestCase,
    /// Test case id not registered on the work pad
    UnknownTestCase,
    /// Lookup key not recognised by any work pad in the lab
    InvalidParameter,
}

impl ErrorCode {
    /// Returns the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateTestCase => "DUPLICATE_TEST_CASE",
            ErrorCode::UnknownTestCase => "UNKNOWN_TEST_CASE",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workbench and test lab error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConformanceError {
    #[error("Test case {test_case_id} is already registered with workbench {workbench_id}")]
    DuplicateTestCase {
        workbench_id: String,
        test_case_id: String,
    },

    #[error("Test case {test_case_id} is not registered with workbench {workbench_id}")]
    UnknownTestCase {
        workbench_id: String,
        test_case_id: String,
    },

    #[error("Invalid {parameter} '{value}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        reason: String,
    },
}

impl ConformanceError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ConformanceError::DuplicateTestCase { .. } => ErrorCode::DuplicateTestCase,
            ConformanceError::UnknownTestCase { .. } => ErrorCode::UnknownTestCase,
            ConformanceError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
        }
    }

    pub(crate) fn invalid_parameter(
        parameter: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConformanceError::InvalidParameter {
            parameter,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConformanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_str() {
        assert_eq!(ErrorCode::DuplicateTestCase.as_str(), "DUPLICATE_TEST_CASE");
        assert_eq!(ErrorCode::InvalidParameter.to_string(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_error_message_and_code() {
        let err = ConformanceError::DuplicateTestCase {
            workbench_id: "repository-workbench".to_string(),
            test_case_id: "repo-find-entities-001".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::DuplicateTestCase);
        assert!(err.to_string().contains("repo-find-entities-001"));

        let err =
            ConformanceError::invalid_parameter("profile name", "Nope", "no workbench defines it");
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert_eq!(
            err.to_string(),
            "Invalid profile name 'Nope': no workbench defines it"
        );
    }
}
