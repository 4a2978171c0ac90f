//! Work pad: the conformance ledger of one workbench.
//!
//! Every test case registers here and every piece of evidence lands here.
//! All reads and writes of the evidence list and the test-case registry go
//! through a single mutex; nothing under that lock performs I/O.
//!
//! Completion is two-phase: the harness marks the synchronous tests as
//! finished, and the workbench only reports complete once no activity has
//! been registered for the quiescence delay. Asynchronous, event-driven test
//! cases get that window to finish recording.

use chrono::{DateTime, Utc};
use conformance_report::{
    Evidence, ExceptionDetail, ProfileResults, ProfileSummary, TestCaseResult, TestCaseSummary,
    TestEvidenceType, WorkbenchResults, WorkbenchStatus, WorkbenchSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{ConformanceError, Result};
use crate::profiles::ProfileCatalog;
use crate::test_case::{Assertion, TestCaseIdentity, TestCaseRecord};

/// Default quiet period before a finished workbench reports complete
pub const DEFAULT_QUIESCENCE_SECONDS: u64 = 10;

/// Default maximum page size for paged queries against the technology
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Assertion id used for unexpected-exception evidence
pub const UNEXPECTED_EXCEPTION_ASSERTION_ID: &str = "unexpected-exception";

/// Identity of a workbench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbenchIdentity {
    pub workbench_id: String,
    pub workbench_name: String,
    pub version_number: String,
    pub documentation_url: String,
}

impl WorkbenchIdentity {
    pub fn new(
        workbench_id: impl Into<String>,
        workbench_name: impl Into<String>,
        version_number: impl Into<String>,
        documentation_url: impl Into<String>,
    ) -> Self {
        Self {
            workbench_id: workbench_id.into(),
            workbench_name: workbench_name.into(),
            version_number: version_number.into(),
            documentation_url: documentation_url.into(),
        }
    }
}

/// Connection details for the technology under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutConnection {
    pub server_name: String,
    #[serde(default)]
    pub root_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default)]
struct Ledger {
    evidence: Vec<Evidence>,
    test_cases: Vec<Arc<TestCaseRecord>>,
    index: HashMap<String, usize>,
}

impl Ledger {
    fn partition(&self) -> (Vec<TestCaseResult>, Vec<TestCaseResult>, Vec<TestCaseSummary>) {
        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut skipped = Vec::new();

        for record in &self.test_cases {
            match record.result() {
                Some(result) if result.passed() => passed.push(result),
                Some(result) => failed.push(result),
                None => skipped.push(record.summary()),
            }
        }

        (passed, failed, skipped)
    }
}

#[derive(Debug, Clone, Copy)]
struct Activity {
    instant: Instant,
    at: DateTime<Utc>,
}

impl Activity {
    fn now() -> Self {
        Self {
            instant: Instant::now(),
            at: Utc::now(),
        }
    }
}

/// Conformance ledger for one workbench.
pub struct WorkPad {
    identity: WorkbenchIdentity,
    tut: TutConnection,
    max_page_size: u32,
    quiescence: Duration,
    catalog: Box<dyn ProfileCatalog>,
    workbench_complete: AtomicBool,
    last_active: Mutex<Activity>,
    ledger: Mutex<Ledger>,
}

impl fmt::Debug for WorkPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkPad")
            .field("identity", &self.identity)
            .field("tut", &self.tut)
            .field("max_page_size", &self.max_page_size)
            .field("quiescence", &self.quiescence)
            .field("workbench_complete", &self.workbench_complete)
            .finish_non_exhaustive()
    }
}

impl WorkPad {
    /// Create a work pad with default page size and quiescence delay.
    pub fn new(identity: WorkbenchIdentity, catalog: impl ProfileCatalog + 'static) -> Self {
        Self {
            identity,
            tut: TutConnection::default(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            quiescence: Duration::from_secs(DEFAULT_QUIESCENCE_SECONDS),
            catalog: Box::new(catalog),
            workbench_complete: AtomicBool::new(false),
            last_active: Mutex::new(Activity::now()),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn with_tut(mut self, tut: TutConnection) -> Self {
        self.tut = tut;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence = quiescence;
        self
    }

    pub fn identity(&self) -> &WorkbenchIdentity {
        &self.identity
    }

    pub fn workbench_id(&self) -> &str {
        &self.identity.workbench_id
    }

    pub fn tut(&self) -> &TutConnection {
        &self.tut
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    // Every mutation is a single push/insert, so a guard recovered from a
    // poisoned lock still sees consistent data.
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a test case. A duplicate id is a wiring defect.
    pub fn register_test_case(&self, record: Arc<TestCaseRecord>) -> Result<()> {
        let mut ledger = self.ledger();
        let id = record.id().to_string();
        if ledger.index.contains_key(&id) {
            return Err(ConformanceError::DuplicateTestCase {
                workbench_id: self.identity.workbench_id.clone(),
                test_case_id: id,
            });
        }

        let position = ledger.test_cases.len();
        ledger.test_cases.push(record);
        ledger.index.insert(id.clone(), position);
        debug!(
            workbench_id = %self.identity.workbench_id,
            test_case_id = %id,
            "test case registered"
        );
        Ok(())
    }

    /// Registered test case ids in registration order.
    pub fn test_case_ids(&self) -> Vec<String> {
        self.ledger()
            .test_cases
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    fn push(&self, evidence: Evidence) {
        self.ledger().evidence.push(evidence);
    }

    fn assertion_evidence(
        ty: TestEvidenceType,
        test_case: &TestCaseIdentity,
        assertion: &Assertion,
    ) -> Evidence {
        Evidence::new(
            ty,
            assertion.profile_id,
            assertion.requirement_id,
            &test_case.id,
            &test_case.name,
            &test_case.documentation_url,
            &assertion.assertion_id,
        )
        .with_message(&assertion.message)
        .with_method(assertion.method_name.clone(), assertion.elapsed_ms)
    }

    pub fn add_successful_condition(&self, test_case: &TestCaseIdentity, assertion: &Assertion) {
        self.push(Self::assertion_evidence(
            TestEvidenceType::SuccessfulAssertion,
            test_case,
            assertion,
        ));
    }

    pub fn add_unsuccessful_condition(&self, test_case: &TestCaseIdentity, assertion: &Assertion) {
        self.push(Self::assertion_evidence(
            TestEvidenceType::UnsuccessfulAssertion,
            test_case,
            assertion,
        ));
    }

    pub fn add_not_supported_condition(&self, test_case: &TestCaseIdentity, assertion: &Assertion) {
        self.push(Self::assertion_evidence(
            TestEvidenceType::NotSupportedFunction,
            test_case,
            assertion,
        ));
    }

    pub fn add_discovered_property(
        &self,
        test_case: &TestCaseIdentity,
        profile_id: u32,
        requirement_id: u32,
        property_name: &str,
        property_value: serde_json::Value,
    ) {
        self.push(
            Evidence::new(
                TestEvidenceType::DiscoveredProperty,
                profile_id,
                requirement_id,
                &test_case.id,
                &test_case.name,
                &test_case.documentation_url,
                property_name,
            )
            .with_property(property_name, property_value),
        );
    }

    pub fn add_unexpected_exception(
        &self,
        test_case: &TestCaseIdentity,
        profile_id: u32,
        requirement_id: u32,
        exception: &ExceptionDetail,
    ) {
        self.push(
            Evidence::new(
                TestEvidenceType::UnexpectedException,
                profile_id,
                requirement_id,
                &test_case.id,
                &test_case.name,
                &test_case.documentation_url,
                UNEXPECTED_EXCEPTION_ASSERTION_ID,
            )
            .with_method(exception.method_name.clone(), None)
            .with_exception(exception.clone()),
        );
    }

    /// Snapshot of all evidence recorded so far.
    pub fn evidence(&self) -> Vec<Evidence> {
        self.ledger().evidence.clone()
    }

    pub fn evidence_count(&self) -> usize {
        self.ledger().evidence.len()
    }

    /// Note that something happened, e.g. an inbound event was processed.
    pub fn register_activity(&self) {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner) = Activity::now();
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .at
    }

    /// Mark the synchronous tests as finished. Also counts as activity.
    pub fn set_workbench_complete(&self) {
        self.register_activity();
        self.workbench_complete.store(true, Ordering::SeqCst);
        info!(workbench_id = %self.identity.workbench_id, "synchronous tests complete");
    }

    /// Complete once the synchronous tests are done and the workbench has
    /// been quiet for the quiescence delay.
    pub fn is_complete(&self) -> bool {
        if !self.workbench_complete.load(Ordering::SeqCst) {
            return false;
        }
        let last = self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .instant;
        last.elapsed() >= self.quiescence
    }

    pub fn workbench_status(&self) -> WorkbenchStatus {
        WorkbenchStatus {
            workbench_id: self.identity.workbench_id.clone(),
            workbench_complete: self.is_complete(),
        }
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.catalog.profile_names()
    }

    pub fn profile_results(&self) -> Vec<ProfileResults> {
        let evidence = self.evidence();
        self.catalog.profile_results(&evidence)
    }

    pub fn profile_summaries(&self) -> Vec<ProfileSummary> {
        let evidence = self.evidence();
        self.catalog.profile_summaries(&evidence)
    }

    /// Results for the named profile, if this workbench defines it.
    pub fn profile_result(&self, profile_name: &str) -> Option<ProfileResults> {
        if !self.profile_names().iter().any(|n| n == profile_name) {
            return None;
        }
        self.profile_results()
            .into_iter()
            .find(|p| p.name == profile_name)
    }

    /// Result of one test case; `Ok(None)` if it is registered but has not run.
    pub fn test_case_result(&self, test_case_id: &str) -> Result<Option<TestCaseResult>> {
        let ledger = self.ledger();
        match ledger.index.get(test_case_id) {
            Some(&position) => Ok(ledger.test_cases[position].result()),
            None => Err(ConformanceError::UnknownTestCase {
                workbench_id: self.identity.workbench_id.clone(),
                test_case_id: test_case_id.to_string(),
            }),
        }
    }

    pub fn failed_test_cases(&self) -> Vec<TestCaseResult> {
        self.ledger().partition().1
    }

    pub fn workbench_results(&self) -> WorkbenchResults {
        let (evidence, (passed, failed, skipped)) = {
            let ledger = self.ledger();
            (ledger.evidence.clone(), ledger.partition())
        };

        WorkbenchResults {
            workbench_id: self.identity.workbench_id.clone(),
            workbench_name: self.identity.workbench_name.clone(),
            version_number: self.identity.version_number.clone(),
            workbench_documentation_url: self.identity.documentation_url.clone(),
            workbench_complete: self.is_complete(),
            profile_results: self.catalog.profile_results(&evidence),
            passed_test_cases: passed,
            failed_test_cases: failed,
            skipped_test_cases: skipped,
        }
    }

    pub fn workbench_summary(&self) -> WorkbenchSummary {
        let (evidence, (passed, failed, skipped)) = {
            let ledger = self.ledger();
            (ledger.evidence.clone(), ledger.partition())
        };

        WorkbenchSummary {
            workbench_id: self.identity.workbench_id.clone(),
            workbench_name: self.identity.workbench_name.clone(),
            version_number: self.identity.version_number.clone(),
            workbench_documentation_url: self.identity.documentation_url.clone(),
            workbench_complete: self.is_complete(),
            test_case_count: passed.len() + failed.len() + skipped.len(),
            test_pass_count: passed.len(),
            test_failed_count: failed.len(),
            test_skipped_count: skipped.len(),
            profile_summaries: self.catalog.profile_summaries(&evidence),
            failed_test_cases: failed.iter().map(TestCaseResult::summary).collect(),
        }
    }
}
