//! Assertions, phases and the typed early exit of a test case.

use conformance_report::ExceptionDetail;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Phase of a multi-phase test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestPhase {
    Seed,
    Execute,
    Clean,
}

impl TestPhase {
    /// Phases in execution order.
    pub fn all() -> &'static [TestPhase] {
        &[TestPhase::Seed, TestPhase::Execute, TestPhase::Clean]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestPhase::Seed => "SEED",
            TestPhase::Execute => "EXECUTE",
            TestPhase::Clean => "CLEAN",
        }
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One checkable statement about the technology under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub assertion_id: String,
    pub message: String,
    pub profile_id: u32,
    pub requirement_id: u32,
    pub method_name: Option<String>,
    pub elapsed_ms: Option<u64>,
}

impl Assertion {
    pub fn new(
        assertion_id: impl Into<String>,
        message: impl Into<String>,
        profile_id: u32,
        requirement_id: u32,
    ) -> Self {
        Self {
            assertion_id: assertion_id.into(),
            message: message.into(),
            profile_id,
            requirement_id,
            method_name: None,
            elapsed_ms: None,
        }
    }

    /// Attach the method that was called and how long it took.
    pub fn timed(mut self, method_name: impl Into<String>, elapsed_ms: u64) -> Self {
        self.method_name = Some(method_name.into());
        self.elapsed_ms = Some(elapsed_ms);
        self
    }

    /// Text stored in the test case's assertion lists.
    pub fn description(&self) -> String {
        format!("{} {}", self.assertion_id, self.message)
    }
}

/// Why `run` stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestFailure {
    /// A stop-the-test assertion was false. The evidence is already recorded.
    #[error("Assertion {assertion_id} failed: {message}")]
    AssertionFailed { assertion_id: String, message: String },

    /// Anything else that went wrong inside the test case.
    #[error("{}: {}", .0.exception_class_name, .0.exception_message)]
    Unexpected(ExceptionDetail),
}

impl TestFailure {
    /// Wrap an error raised by the technology under test.
    pub fn unexpected<E: std::error::Error + 'static>(err: &E) -> Self {
        TestFailure::Unexpected(ExceptionDetail::new(
            std::any::type_name::<E>(),
            err.to_string(),
        ))
    }

    /// Same as `unexpected`, noting which method raised the error.
    pub fn unexpected_in<E: std::error::Error + 'static>(method_name: &str, err: &E) -> Self {
        TestFailure::Unexpected(
            ExceptionDetail::new(std::any::type_name::<E>(), err.to_string())
                .with_method(method_name),
        )
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "test case panicked".to_string()
        };
        TestFailure::Unexpected(ExceptionDetail::new("panic", message))
    }

    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, TestFailure::AssertionFailed { .. })
    }
}

/// Result of running (a phase of) a test case.
pub type TestOutcome = Result<(), TestFailure>;
