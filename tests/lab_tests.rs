//! Test lab aggregation tests
//!
//! Several work pads feed one lab; these tests check the lab-level
//! lookups and the results/summary tree built from them.

mod fixtures;

use conformance_workbench::{
    Assertion, ConformanceStatus, ConformanceTestCase, ErrorCode, TestCase, TestLab, WorkPad,
};
use fixtures::{work_pad, Scripted, PAGING_REQUIREMENT, SEARCH_REQUIREMENT, SHARING_PROFILE};
use std::sync::Arc;
use std::time::Duration;

fn passing(pad: &Arc<WorkPad>, id: &str) -> Box<dyn ConformanceTestCase> {
    Scripted::boxed(pad, id, |tc: &TestCase| {
        tc.assert_condition(
            true,
            Assertion::new("ok-1", "search works", SHARING_PROFILE, SEARCH_REQUIREMENT),
        )
    })
}

fn failing(pad: &Arc<WorkPad>, id: &str) -> Box<dyn ConformanceTestCase> {
    Scripted::boxed(pad, id, |tc: &TestCase| {
        tc.assert_condition(
            false,
            Assertion::new("page-1", "paging honoured", SHARING_PROFILE, PAGING_REQUIREMENT),
        )
    })
}

fn lab_with(pads: Vec<Arc<WorkPad>>) -> TestLab {
    let mut lab = TestLab::new(Some("mock-repository".to_string()));
    for pad in pads {
        lab.add_work_pad(pad);
    }
    lab
}

#[test]
fn test_run_id_is_lowercase_ulid() {
    let lab = TestLab::new(None);
    assert_eq!(lab.test_run_id().len(), 26);
    assert_eq!(lab.test_run_id(), lab.test_run_id().to_lowercase());
    assert!(lab.tut_name().is_none());
}

#[test]
fn test_clean_lab_passes() {
    let pad_a = work_pad("wb-a", Duration::ZERO);
    let pad_b = work_pad("wb-b", Duration::ZERO);
    passing(&pad_a, "tc-a1").execute_test();
    passing(&pad_b, "tc-b1").execute_test();
    pad_a.set_workbench_complete();
    pad_b.set_workbench_complete();

    let lab = lab_with(vec![pad_a, pad_b]);
    assert!(lab.is_complete());
    assert_eq!(lab.workbench_ids(), vec!["wb-a", "wb-b"]);
    assert_eq!(lab.profile_names(), vec!["Metadata sharing", "Lineage"]);
    assert!(lab.failed_test_case_report().is_none());

    let summary = lab.test_lab_summary();
    assert_eq!(summary.test_case_count(), 2);
    assert!(summary.passed());
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_failure_in_one_pad_fails_lab() {
    let pad_a = work_pad("wb-a", Duration::ZERO);
    let pad_b = work_pad("wb-b", Duration::ZERO);
    passing(&pad_a, "tc-a1").execute_test();
    failing(&pad_b, "tc-b1").execute_test();

    let lab = lab_with(vec![pad_a, pad_b]);

    let failed = lab.failed_test_case_report().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].test_case_id, "tc-b1");

    let summary = lab.test_lab_summary();
    assert_eq!(summary.test_failed_count(), 1);
    assert!(!summary.passed());
    assert_eq!(summary.exit_code(), 1);

    // first pad that defines the profile wins
    let profile = lab.profile_report("Metadata sharing").unwrap();
    assert_eq!(profile.conformance_status, ConformanceStatus::ConformantFullSupport);
    let b = lab.workbench_report("wb-b").unwrap();
    assert_eq!(b.profile_results[0].conformance_status, ConformanceStatus::NotConformant);
}

#[test]
fn test_incomplete_pad_keeps_lab_incomplete() {
    let pad_a = work_pad("wb-a", Duration::ZERO);
    let pad_b = work_pad("wb-b", Duration::from_secs(60));
    pad_a.set_workbench_complete();
    pad_b.set_workbench_complete();

    let lab = lab_with(vec![pad_a, pad_b]);
    assert!(!lab.is_complete());
    assert!(lab.workbench_status("wb-a").unwrap().workbench_complete);
    assert!(!lab.workbench_status("wb-b").unwrap().workbench_complete);
}

#[test]
fn test_test_case_lookup() {
    let pad_a = work_pad("wb-a", Duration::ZERO);
    let pad_b = work_pad("wb-b", Duration::ZERO);
    let _idle = TestCase::new(&pad_a, fixtures::test_case_identity("tc-idle")).unwrap();
    passing(&pad_b, "tc-b1").execute_test();

    let lab = lab_with(vec![pad_a, pad_b]);

    assert!(lab.test_case_report("tc-idle").unwrap().is_none());
    let result = lab.test_case_report("tc-b1").unwrap().unwrap();
    assert!(result.passed());

    let err = lab.test_case_report("tc-missing").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParameter);
}

#[test]
fn test_unknown_names_are_invalid_parameters() {
    let lab = lab_with(vec![work_pad("wb-a", Duration::ZERO)]);

    assert_eq!(
        lab.profile_report("No such profile").unwrap_err().code(),
        ErrorCode::InvalidParameter
    );
    assert_eq!(
        lab.workbench_report("wb-z").unwrap_err().code(),
        ErrorCode::InvalidParameter
    );
    assert_eq!(
        lab.workbench_status("wb-z").unwrap_err().code(),
        ErrorCode::InvalidParameter
    );
}

#[test]
fn test_results_serialize_camel_case() {
    let pad = work_pad("wb-a", Duration::ZERO);
    failing(&pad, "tc-a1").execute_test();
    let lab = lab_with(vec![pad]);

    let value = serde_json::to_value(lab.test_lab_results()).unwrap();
    assert_eq!(value["tutName"], "mock-repository");
    let workbench = &value["workbenchResults"][0];
    assert_eq!(workbench["workbenchId"], "wb-a");
    assert_eq!(workbench["failedTestCases"][0]["testCaseId"], "tc-a1");
    assert_eq!(
        workbench["profileResults"][0]["conformanceStatus"],
        "NOT_CONFORMANT"
    );
}
