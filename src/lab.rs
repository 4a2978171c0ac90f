//! Test lab: read-side aggregation over the work pads of one run.

use chrono::{DateTime, Utc};
use conformance_report::{
    ProfileResults, TestCaseResult, TestLabResults, TestLabSummary, WorkbenchResults,
    WorkbenchStatus,
};
use std::sync::Arc;

use crate::error::{ConformanceError, Result};
use crate::work_pad::WorkPad;

/// Aggregates every workbench run against one technology under test.
#[derive(Debug)]
pub struct TestLab {
    test_run_date: DateTime<Utc>,
    test_run_id: String,
    tut_name: Option<String>,
    work_pads: Vec<Arc<WorkPad>>,
}

impl TestLab {
    /// New lab stamped with the current time and a fresh run id.
    pub fn new(tut_name: Option<String>) -> Self {
        Self {
            test_run_date: Utc::now(),
            test_run_id: ulid::Ulid::new().to_string().to_lowercase(),
            tut_name,
            work_pads: Vec::new(),
        }
    }

    pub fn add_work_pad(&mut self, work_pad: Arc<WorkPad>) {
        self.work_pads.push(work_pad);
    }

    pub fn work_pads(&self) -> &[Arc<WorkPad>] {
        &self.work_pads
    }

    pub fn test_run_date(&self) -> DateTime<Utc> {
        self.test_run_date
    }

    pub fn test_run_id(&self) -> &str {
        &self.test_run_id
    }

    pub fn tut_name(&self) -> Option<&str> {
        self.tut_name.as_deref()
    }

    /// Ordered union of profile names across all work pads.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for pad in &self.work_pads {
            for name in pad.profile_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn workbench_ids(&self) -> Vec<String> {
        self.work_pads
            .iter()
            .map(|p| p.workbench_id().to_string())
            .collect()
    }

    /// True when every work pad reports complete.
    pub fn is_complete(&self) -> bool {
        self.work_pads.iter().all(|p| p.is_complete())
    }

    /// Results for the named profile from the first work pad that defines it.
    pub fn profile_report(&self, profile_name: &str) -> Result<ProfileResults> {
        self.work_pads
            .iter()
            .find_map(|p| p.profile_result(profile_name))
            .ok_or_else(|| {
                ConformanceError::invalid_parameter(
                    "profile name",
                    profile_name,
                    "no workbench defines this profile",
                )
            })
    }

    /// Result of the test case from the first work pad that knows it.
    ///
    /// `Ok(None)` means the test case is registered but has not run.
    pub fn test_case_report(&self, test_case_id: &str) -> Result<Option<TestCaseResult>> {
        for pad in &self.work_pads {
            match pad.test_case_result(test_case_id) {
                Ok(result) => return Ok(result),
                Err(ConformanceError::UnknownTestCase { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(ConformanceError::invalid_parameter(
            "test case id",
            test_case_id,
            "no workbench has registered this test case",
        ))
    }

    /// Failed test cases across all work pads, `None` if nothing failed.
    pub fn failed_test_case_report(&self) -> Option<Vec<TestCaseResult>> {
        let failed: Vec<TestCaseResult> = self
            .work_pads
            .iter()
            .flat_map(|p| p.failed_test_cases())
            .collect();
        if failed.is_empty() {
            None
        } else {
            Some(failed)
        }
    }

    fn work_pad(&self, workbench_id: &str) -> Result<&Arc<WorkPad>> {
        self.work_pads
            .iter()
            .find(|p| p.workbench_id() == workbench_id)
            .ok_or_else(|| {
                ConformanceError::invalid_parameter(
                    "workbench id",
                    workbench_id,
                    "no such workbench in this test lab",
                )
            })
    }

    pub fn workbench_report(&self, workbench_id: &str) -> Result<WorkbenchResults> {
        Ok(self.work_pad(workbench_id)?.workbench_results())
    }

    pub fn workbench_status(&self, workbench_id: &str) -> Result<WorkbenchStatus> {
        Ok(self.work_pad(workbench_id)?.workbench_status())
    }

    pub fn test_lab_results(&self) -> TestLabResults {
        TestLabResults {
            test_run_date: self.test_run_date,
            test_run_id: Some(self.test_run_id.clone()),
            tut_name: self.tut_name.clone(),
            workbench_results: self.work_pads.iter().map(|p| p.workbench_results()).collect(),
        }
    }

    pub fn test_lab_summary(&self) -> TestLabSummary {
        TestLabSummary {
            test_run_date: self.test_run_date,
            test_run_id: Some(self.test_run_id.clone()),
            tut_name: self.tut_name.clone(),
            workbench_summaries: self.work_pads.iter().map(|p| p.workbench_summary()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::profiles::{ProfileDefinition, RequirementDefinition, StaticProfileCatalog};
    use crate::test_case::{Assertion, TestCase, TestCaseIdentity};
    use crate::work_pad::WorkbenchIdentity;
    use conformance_report::{ConformanceStatus, ProfilePriority};

    fn pad(id: &str, profiles: Vec<ProfileDefinition>) -> Arc<WorkPad> {
        Arc::new(WorkPad::new(
            WorkbenchIdentity::new(id, id, "1.0", format!("https://example.org/{}", id)),
            StaticProfileCatalog::new(profiles),
        ))
    }

    fn lab() -> (TestLab, Arc<WorkPad>, Arc<WorkPad>) {
        let repository = pad(
            "repository-workbench",
            vec![ProfileDefinition::new(5, "Metadata sharing", ProfilePriority::Mandatory)
                .with_requirement(RequirementDefinition::new(2, "Entity search"))],
        );
        let events = pad(
            "event-workbench",
            vec![
                ProfileDefinition::new(5, "Metadata sharing", ProfilePriority::Mandatory),
                ProfileDefinition::new(9, "Event notification", ProfilePriority::Optional),
            ],
        );

        let mut lab = TestLab::new(Some("mock-repository".to_string()));
        lab.add_work_pad(Arc::clone(&repository));
        lab.add_work_pad(Arc::clone(&events));
        (lab, repository, events)
    }

    #[test]
    fn test_run_identity() {
        let (lab, _, _) = lab();
        assert_eq!(lab.test_run_id().len(), 26);
        assert_eq!(lab.tut_name(), Some("mock-repository"));
        assert_eq!(lab.test_lab_results().test_run_date, lab.test_run_date());
    }

    #[test]
    fn test_profile_names_union() {
        let (lab, _, _) = lab();
        assert_eq!(
            lab.profile_names(),
            vec!["Metadata sharing", "Event notification"]
        );
        assert_eq!(
            lab.workbench_ids(),
            vec!["repository-workbench", "event-workbench"]
        );
    }

    #[test]
    fn test_profile_report_first_match_wins() {
        let (lab, repository, _) = lab();
        let tc = TestCase::new(
            &repository,
            TestCaseIdentity::new("tc-1", "tc-1", "url", 5, 2),
        )
        .unwrap();
        tc.verify_condition(true, Assertion::new("A1", "ok", 5, 2));

        let report = lab.profile_report("Metadata sharing").unwrap();
        assert_eq!(report.requirement_results.len(), 1);
        assert_eq!(report.conformance_status, ConformanceStatus::ConformantFullSupport);

        let err = lab.profile_report("Nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_test_case_report_scans_all_pads() {
        let (lab, _, events) = lab();
        let tc =
            TestCase::new(&events, TestCaseIdentity::new("ev-1", "ev-1", "url", 9, 0)).unwrap();

        // Registered in the second pad only, not yet run
        assert_eq!(lab.test_case_report("ev-1").unwrap(), None);

        tc.verify_condition(false, Assertion::new("A1", "event seen", 9, 0));
        let result = lab.test_case_report("ev-1").unwrap().unwrap();
        assert_eq!(result.unsuccessful_assertions.len(), 1);

        let err = lab.test_case_report("missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_failed_report_and_workbench_lookup() {
        let (lab, repository, _) = lab();
        assert!(lab.failed_test_case_report().is_none());

        let identity = TestCaseIdentity::new("tc-1", "tc-1", "url", 5, 2);
        let tc = TestCase::new(&repository, identity).unwrap();
        tc.verify_condition(false, Assertion::new("A1", "broken", 5, 2));
        assert_eq!(lab.failed_test_case_report().unwrap().len(), 1);

        let status = lab.workbench_status("repository-workbench").unwrap();
        assert!(!status.workbench_complete);
        assert!(lab.workbench_report("nope").is_err());
        assert_eq!(
            lab.workbench_status("nope").unwrap_err().code(),
            ErrorCode::InvalidParameter
        );
    }

    #[test]
    fn test_summary_exit_code() {
        let (lab, repository, _) = lab();
        let identity = TestCaseIdentity::new("tc-1", "tc-1", "url", 5, 2);
        let tc = TestCase::new(&repository, identity).unwrap();
        tc.verify_condition(true, Assertion::new("A1", "ok", 5, 2));
        assert!(lab.test_lab_summary().passed());

        tc.verify_condition(false, Assertion::new("A2", "not ok", 5, 2));
        let summary = lab.test_lab_summary();
        assert!(!summary.passed());
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary, lab.test_lab_results().summary());
    }
}
