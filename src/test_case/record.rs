//! Test case identity and accumulated outcome state.

use conformance_report::{ExceptionDetail, TestCaseResult, TestCaseSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Stable identity of a test case plus the profile/requirement that
/// unexpected failures are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseIdentity {
    pub id: String,
    pub name: String,
    pub documentation_url: String,
    pub default_profile_id: u32,
    pub default_requirement_id: u32,
}

impl TestCaseIdentity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        documentation_url: impl Into<String>,
        default_profile_id: u32,
        default_requirement_id: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            documentation_url: documentation_url.into(),
            default_profile_id,
            default_requirement_id,
        }
    }

    pub fn summary(&self) -> TestCaseSummary {
        TestCaseSummary {
            test_case_id: self.id.clone(),
            test_case_name: self.name.clone(),
            test_case_description_url: self.documentation_url.clone(),
        }
    }
}

/// Where a test case is in its lifecycle.
///
/// REGISTERED → RUNNING → {RAN_PASSED | RAN_FAILED}. Phased test cases
/// re-enter RUNNING once per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestCaseLifecycle {
    Registered,
    Running,
    RanPassed,
    RanFailed,
}

#[derive(Debug, Default)]
struct TestCaseState {
    successful_assertions: Vec<String>,
    unsuccessful_assertions: Vec<String>,
    not_supported_assertions: Vec<String>,
    discovered_properties: BTreeMap<String, serde_json::Value>,
    exception: Option<ExceptionDetail>,
    success_message: Option<String>,
    elapsed_ms: Option<u64>,
    running: bool,
}

impl TestCaseState {
    fn ran(&self) -> bool {
        !self.successful_assertions.is_empty()
            || !self.unsuccessful_assertions.is_empty()
            || !self.not_supported_assertions.is_empty()
            || self.exception.is_some()
    }

    fn passed(&self) -> bool {
        self.ran() && self.unsuccessful_assertions.is_empty() && self.exception.is_none()
    }

    fn add_elapsed(&mut self, elapsed_ms: Option<u64>) {
        if let Some(ms) = elapsed_ms {
            self.elapsed_ms = Some(self.elapsed_ms.unwrap_or(0).saturating_add(ms));
        }
    }
}

/// Shared outcome state of one test case.
///
/// Held by the work pad for reporting and by the `TestCase` handle for
/// recording. Recording may happen from any thread.
#[derive(Debug)]
pub struct TestCaseRecord {
    identity: TestCaseIdentity,
    state: Mutex<TestCaseState>,
}

impl TestCaseRecord {
    pub fn new(identity: TestCaseIdentity) -> Self {
        Self {
            identity,
            state: Mutex::new(TestCaseState::default()),
        }
    }

    pub fn identity(&self) -> &TestCaseIdentity {
        &self.identity
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    // Every mutation is a single push, so a poisoned guard still holds
    // consistent data.
    fn state(&self) -> MutexGuard<'_, TestCaseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_success(&self, description: String, elapsed_ms: Option<u64>) {
        let mut state = self.state();
        state.successful_assertions.push(description);
        state.add_elapsed(elapsed_ms);
    }

    pub(crate) fn record_failure(&self, description: String, elapsed_ms: Option<u64>) {
        let mut state = self.state();
        state.unsuccessful_assertions.push(description);
        state.add_elapsed(elapsed_ms);
    }

    pub(crate) fn record_not_supported(&self, description: String, elapsed_ms: Option<u64>) {
        let mut state = self.state();
        state.not_supported_assertions.push(description);
        state.add_elapsed(elapsed_ms);
    }

    pub(crate) fn record_property(&self, name: String, value: serde_json::Value) {
        self.state().discovered_properties.insert(name, value);
    }

    /// Keeps the first exception; later ones still reach the evidence list.
    pub(crate) fn record_exception(&self, exception: ExceptionDetail) {
        let mut state = self.state();
        if state.exception.is_none() {
            state.exception = Some(exception);
        }
    }

    pub(crate) fn set_success_message(&self, message: String) {
        self.state().success_message = Some(message);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.state().running = running;
    }

    /// At least one assertion has been recorded.
    pub fn is_test_ran(&self) -> bool {
        self.state().ran()
    }

    /// Ran, with no unsuccessful assertion and no unexpected exception.
    pub fn is_test_passed(&self) -> bool {
        self.state().passed()
    }

    pub fn lifecycle(&self) -> TestCaseLifecycle {
        let state = self.state();
        if state.running {
            TestCaseLifecycle::Running
        } else if !state.ran() {
            TestCaseLifecycle::Registered
        } else if state.passed() {
            TestCaseLifecycle::RanPassed
        } else {
            TestCaseLifecycle::RanFailed
        }
    }

    /// Detailed result, or `None` if the test case has not run.
    pub fn result(&self) -> Option<TestCaseResult> {
        let state = self.state();
        if !state.ran() {
            return None;
        }

        Some(TestCaseResult {
            test_case_id: self.identity.id.clone(),
            test_case_name: self.identity.name.clone(),
            test_case_description_url: self.identity.documentation_url.clone(),
            success_message: state.success_message.clone(),
            successful_assertions: state.successful_assertions.clone(),
            unsuccessful_assertions: state.unsuccessful_assertions.clone(),
            not_supported_assertions: state.not_supported_assertions.clone(),
            discovered_properties: state.discovered_properties.clone(),
            conformance_exception: state.exception.clone(),
            elapsed_time: state.elapsed_ms,
        })
    }

    pub fn summary(&self) -> TestCaseSummary {
        self.identity.summary()
    }
}
