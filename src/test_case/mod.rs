//! Test cases
//!
//! A test case is split into two parts:
//! - `TestCase`: the recording handle. It owns the shared `TestCaseRecord`
//!   and a reference to the work pad, and is cheap to clone so event
//!   listeners can record assertions from their own threads.
//! - `ConformanceTestCase`: the trait a concrete scenario implements. Its
//!   provided `execute_test*` and `clean_test` methods wrap `run` so that no
//!   failure inside one test case can escape to the harness.

mod failure;
mod record;

pub use failure::{Assertion, TestFailure, TestOutcome, TestPhase};
pub use record::{TestCaseIdentity, TestCaseLifecycle, TestCaseRecord};

use conformance_report::{ExceptionDetail, TestCaseResult, TestCaseSummary};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::work_pad::WorkPad;

/// Recording handle for one registered test case.
#[derive(Debug, Clone)]
pub struct TestCase {
    record: Arc<TestCaseRecord>,
    work_pad: Arc<WorkPad>,
}

impl TestCase {
    /// Create a test case and register it with the work pad.
    ///
    /// Fails with `DuplicateTestCase` if the id is already registered.
    pub fn new(work_pad: &Arc<WorkPad>, identity: TestCaseIdentity) -> Result<Self> {
        let record = Arc::new(TestCaseRecord::new(identity));
        work_pad.register_test_case(Arc::clone(&record))?;
        Ok(Self {
            record,
            work_pad: Arc::clone(work_pad),
        })
    }

    pub fn identity(&self) -> &TestCaseIdentity {
        self.record.identity()
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn work_pad(&self) -> &Arc<WorkPad> {
        &self.work_pad
    }

    pub fn record(&self) -> &Arc<TestCaseRecord> {
        &self.record
    }

    /// Record the assertion and stop the test if it is false.
    ///
    /// Use when a failed condition makes the rest of the test meaningless.
    pub fn assert_condition(&self, condition: bool, assertion: Assertion) -> TestOutcome {
        if self.verify_condition(condition, assertion.clone()) {
            Ok(())
        } else {
            Err(TestFailure::AssertionFailed {
                assertion_id: assertion.assertion_id,
                message: assertion.message,
            })
        }
    }

    /// Record the assertion and carry on either way. Returns `condition`.
    pub fn verify_condition(&self, condition: bool, assertion: Assertion) -> bool {
        let description = assertion.description();
        if condition {
            self.record.record_success(description, assertion.elapsed_ms);
            self.work_pad
                .add_successful_condition(self.record.identity(), &assertion);
        } else {
            debug!(
                workbench_id = %self.work_pad.workbench_id(),
                test_case_id = %self.id(),
                assertion_id = %assertion.assertion_id,
                "assertion failed"
            );
            self.record.record_failure(description, assertion.elapsed_ms);
            self.work_pad
                .add_unsuccessful_condition(self.record.identity(), &assertion);
        }
        condition
    }

    /// Record that the technology correctly reported a function as unsupported.
    pub fn add_not_supported_assertion(&self, assertion: Assertion) {
        self.record
            .record_not_supported(assertion.description(), assertion.elapsed_ms);
        self.work_pad
            .add_not_supported_condition(self.record.identity(), &assertion);
    }

    /// Record an incidental fact about the technology under test.
    pub fn add_discovered_property(
        &self,
        name: &str,
        value: impl Into<serde_json::Value>,
        profile_id: u32,
        requirement_id: u32,
    ) {
        let value = value.into();
        self.record.record_property(name.to_string(), value.clone());
        self.work_pad.add_discovered_property(
            self.record.identity(),
            profile_id,
            requirement_id,
            name,
            value,
        );
    }

    pub fn set_success_message(&self, message: impl Into<String>) {
        self.record.set_success_message(message.into());
    }

    /// Attribute an unexpected failure to the default profile and requirement.
    pub fn add_unexpected_exception(&self, exception: ExceptionDetail) {
        let identity = self.record.identity();
        warn!(
            workbench_id = %self.work_pad.workbench_id(),
            test_case_id = %identity.id,
            exception_class = %exception.exception_class_name,
            message = %exception.exception_message,
            "unexpected failure in test case"
        );
        self.record.record_exception(exception.clone());
        self.work_pad.add_unexpected_exception(
            identity,
            identity.default_profile_id,
            identity.default_requirement_id,
            &exception,
        );
    }

    pub fn start_asynchronous_test(&self) {
        info!(
            workbench_id = %self.work_pad.workbench_id(),
            test_case_id = %self.id(),
            "asynchronous test started"
        );
    }

    pub fn end_asynchronous_test(&self) {
        info!(
            workbench_id = %self.work_pad.workbench_id(),
            test_case_id = %self.id(),
            passed = self.is_test_passed(),
            "asynchronous test ended"
        );
    }

    pub fn is_test_ran(&self) -> bool {
        self.record.is_test_ran()
    }

    pub fn is_test_passed(&self) -> bool {
        self.record.is_test_passed()
    }

    pub fn lifecycle(&self) -> TestCaseLifecycle {
        self.record.lifecycle()
    }

    /// `None` until at least one assertion has been recorded.
    pub fn result(&self) -> Option<TestCaseResult> {
        self.record.result()
    }

    pub fn summary(&self) -> TestCaseSummary {
        self.record.summary()
    }

    /// Run `body`, absorbing assertion failures, errors and panics.
    fn guarded<F>(&self, phase: Option<TestPhase>, body: F)
    where
        F: FnOnce() -> TestOutcome,
    {
        let phase_name = phase.map(|p| p.as_str()).unwrap_or("RUN");
        info!(
            workbench_id = %self.work_pad.workbench_id(),
            test_case_id = %self.id(),
            phase = phase_name,
            "test case started"
        );
        self.record.set_running(true);

        let outcome = panic::catch_unwind(AssertUnwindSafe(body))
            .unwrap_or_else(|payload| Err(TestFailure::from_panic(payload)));

        match outcome {
            Ok(()) => {}
            Err(TestFailure::AssertionFailed { assertion_id, .. }) => {
                debug!(
                    test_case_id = %self.id(),
                    assertion_id = %assertion_id,
                    "test case stopped by failed assertion"
                );
            }
            Err(TestFailure::Unexpected(exception)) => self.add_unexpected_exception(exception),
        }

        self.record.set_running(false);
        info!(
            workbench_id = %self.work_pad.workbench_id(),
            test_case_id = %self.id(),
            phase = phase_name,
            ran = self.is_test_ran(),
            passed = self.is_test_passed(),
            "test case ended"
        );
    }
}

/// A runnable test scenario.
pub trait ConformanceTestCase: Send + Sync {
    /// The recording handle created when the test case was registered.
    fn test_case(&self) -> &TestCase;

    /// Exercise the technology under test, recording assertions.
    fn run(&self) -> TestOutcome;

    /// Phased test cases override this; by default only EXECUTE does work.
    fn run_phase(&self, phase: TestPhase) -> TestOutcome {
        match phase {
            TestPhase::Execute => self.run(),
            TestPhase::Seed | TestPhase::Clean => Ok(()),
        }
    }

    /// Whether the harness should drive this test case through SEED/EXECUTE/CLEAN.
    fn is_phased(&self) -> bool {
        false
    }

    /// Release anything the test created in the technology under test.
    fn cleanup(&self) -> TestOutcome {
        Ok(())
    }

    /// Run the test case once. Never fails and never panics.
    fn execute_test(&self) {
        self.test_case().guarded(None, || self.run());
    }

    /// Run one phase. Never fails and never panics.
    fn execute_test_phase(&self, phase: TestPhase) {
        self.test_case().guarded(Some(phase), || self.run_phase(phase));
    }

    /// Best-effort cleanup; every failure is swallowed.
    fn clean_test(&self) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.cleanup())) {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => debug!(
                test_case_id = %self.test_case().id(),
                error = %failure,
                "cleanup failed"
            ),
            Err(_) => debug!(test_case_id = %self.test_case().id(), "cleanup panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::StaticProfileCatalog;
    use crate::work_pad::{WorkPad, WorkbenchIdentity};
    use conformance_report::TestEvidenceType;
    use std::io;

    fn work_pad() -> Arc<WorkPad> {
        Arc::new(WorkPad::new(
            WorkbenchIdentity::new("wb", "Workbench", "1.0", "https://example.org/wb"),
            StaticProfileCatalog::default(),
        ))
    }

    fn identity(id: &str) -> TestCaseIdentity {
        TestCaseIdentity::new(id, id, format!("https://example.org/{}", id), 1, 0)
    }

    struct Scripted<F: Fn(&TestCase) -> TestOutcome + Send + Sync> {
        tc: TestCase,
        body: F,
    }

    impl<F: Fn(&TestCase) -> TestOutcome + Send + Sync> ConformanceTestCase for Scripted<F> {
        fn test_case(&self) -> &TestCase {
            &self.tc
        }

        fn run(&self) -> TestOutcome {
            (self.body)(&self.tc)
        }

        fn cleanup(&self) -> TestOutcome {
            Err(TestFailure::unexpected(&io::Error::new(
                io::ErrorKind::Other,
                "cleanup blew up",
            )))
        }
    }

    #[test]
    fn test_assert_condition_stops_test() {
        let pad = work_pad();
        let test = Scripted {
            tc: TestCase::new(&pad, identity("tc-assert")).unwrap(),
            body: |tc: &TestCase| -> TestOutcome {
                tc.assert_condition(false, Assertion::new("A1", "must hold", 1, 0))?;
                tc.verify_condition(true, Assertion::new("A2", "never reached", 1, 0));
                Ok(())
            },
        };

        test.execute_test();

        assert!(test.tc.is_test_ran());
        assert!(!test.tc.is_test_passed());
        let result = test.tc.result().unwrap();
        assert_eq!(result.unsuccessful_assertions, vec!["A1 must hold"]);
        assert!(result.successful_assertions.is_empty());
        assert!(result.conformance_exception.is_none());
    }

    #[test]
    fn test_unexpected_error_is_recorded_not_propagated() {
        let pad = work_pad();
        let test = Scripted {
            tc: TestCase::new(&pad, identity("tc-error")).unwrap(),
            body: |tc: &TestCase| -> TestOutcome {
                tc.verify_condition(true, Assertion::new("A1", "connected", 1, 0));
                let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
                Err(TestFailure::unexpected_in("findEntities", &err))
            },
        };

        test.execute_test();

        assert!(!test.tc.is_test_passed());
        let evidence = pad.evidence();
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[1].test_evidence_type, TestEvidenceType::UnexpectedException);
        assert_eq!(evidence[1].profile_id, 1);
        assert_eq!(
            evidence[1].exception.as_ref().unwrap().method_name.as_deref(),
            Some("findEntities")
        );
    }

    #[test]
    fn test_panic_is_recorded_not_propagated() {
        let pad = work_pad();
        let test = Scripted {
            tc: TestCase::new(&pad, identity("tc-panic")).unwrap(),
            body: |_: &TestCase| -> TestOutcome { panic!("repository exploded") },
        };

        test.execute_test();

        let result = test.tc.result().unwrap();
        let exception = result.conformance_exception.unwrap();
        assert_eq!(exception.exception_class_name, "panic");
        assert_eq!(exception.exception_message, "repository exploded");
        assert_eq!(test.tc.lifecycle(), TestCaseLifecycle::RanFailed);
    }

    #[test]
    fn test_cleanup_failure_is_swallowed() {
        let pad = work_pad();
        let test = Scripted {
            tc: TestCase::new(&pad, identity("tc-clean")).unwrap(),
            body: |tc: &TestCase| -> TestOutcome {
                tc.verify_condition(true, Assertion::new("A1", "ok", 1, 0));
                Ok(())
            },
        };

        test.execute_test();
        test.clean_test();

        assert!(test.tc.is_test_passed());
        assert_eq!(pad.evidence_count(), 1);
    }

    #[test]
    fn test_default_phases_only_execute_runs() {
        let pad = work_pad();
        let test = Scripted {
            tc: TestCase::new(&pad, identity("tc-phase")).unwrap(),
            body: |tc: &TestCase| -> TestOutcome {
                tc.verify_condition(true, Assertion::new("A1", "ok", 1, 0));
                Ok(())
            },
        };

        test.execute_test_phase(TestPhase::Seed);
        assert!(!test.tc.is_test_ran());
        test.execute_test_phase(TestPhase::Execute);
        test.execute_test_phase(TestPhase::Clean);
        assert_eq!(test.tc.result().unwrap().successful_assertions.len(), 1);
    }

    #[test]
    fn test_discovered_property_and_not_supported() {
        let pad = work_pad();
        let tc = TestCase::new(&pad, identity("tc-props")).unwrap();

        tc.add_discovered_property("maxPageSize", 100, 1, 2);
        tc.add_not_supported_assertion(Assertion::new("A9", "history not supported", 1, 3));
        tc.set_success_message("limits discovered");

        let result = tc.result().unwrap();
        assert_eq!(result.discovered_properties["maxPageSize"], serde_json::json!(100));
        assert_eq!(result.not_supported_assertions, vec!["A9 history not supported"]);
        assert_eq!(result.success_message.as_deref(), Some("limits discovered"));
        assert!(tc.is_test_passed());

        let evidence = pad.evidence();
        assert_eq!(evidence[0].test_evidence_type, TestEvidenceType::DiscoveredProperty);
        assert_eq!(evidence[0].property_name.as_deref(), Some("maxPageSize"));
        assert_eq!(evidence[1].test_evidence_type, TestEvidenceType::NotSupportedFunction);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let pad = work_pad();
        TestCase::new(&pad, identity("dup")).unwrap();
        let err = TestCase::new(&pad, identity("dup")).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::DuplicateTestCase);
    }
}
