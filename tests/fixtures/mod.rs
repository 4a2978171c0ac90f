//! Shared fixtures for the integration tests
//!
//! - a small two-profile catalog
//! - work pad builders with short quiescence
//! - `Scripted`, a test case whose body is a closure

#![allow(dead_code)]

use conformance_workbench::{
    ConformanceTestCase, ProfileDefinition, ProfilePriority, RequirementDefinition,
    StaticProfileCatalog, TestCase, TestCaseIdentity, TestOutcome, WorkPad, WorkbenchIdentity,
};
use std::sync::Arc;
use std::time::Duration;

pub const SHARING_PROFILE: u32 = 5;
pub const SEARCH_REQUIREMENT: u32 = 2;
pub const PAGING_REQUIREMENT: u32 = 3;

pub const LINEAGE_PROFILE: u32 = 7;
pub const LINEAGE_REQUIREMENT: u32 = 0;

/// One mandatory and one optional profile
pub fn catalog() -> StaticProfileCatalog {
    StaticProfileCatalog::new(vec![
        ProfileDefinition::new(SHARING_PROFILE, "Metadata sharing", ProfilePriority::Mandatory)
            .with_requirement(RequirementDefinition::new(SEARCH_REQUIREMENT, "Entity search"))
            .with_requirement(RequirementDefinition::new(PAGING_REQUIREMENT, "Paging")),
        ProfileDefinition::new(LINEAGE_PROFILE, "Lineage", ProfilePriority::Optional)
            .with_requirement(RequirementDefinition::new(LINEAGE_REQUIREMENT, "Lineage graph")),
    ])
}

pub fn identity(workbench_id: &str) -> WorkbenchIdentity {
    WorkbenchIdentity::new(
        workbench_id,
        format!("{} workbench", workbench_id),
        "1.0",
        format!("https://example.org/{}", workbench_id),
    )
}

/// Work pad that goes quiet after `quiescence`
pub fn work_pad(workbench_id: &str, quiescence: Duration) -> Arc<WorkPad> {
    Arc::new(WorkPad::new(identity(workbench_id), catalog()).with_quiescence(quiescence))
}

pub fn test_case_identity(id: &str) -> TestCaseIdentity {
    TestCaseIdentity::new(
        id,
        format!("{} name", id),
        format!("https://example.org/tests/{}", id),
        SHARING_PROFILE,
        SEARCH_REQUIREMENT,
    )
}

type Body = Box<dyn Fn(&TestCase) -> TestOutcome + Send + Sync>;

/// Test case whose `run` is supplied by the test
pub struct Scripted {
    tc: TestCase,
    body: Body,
}

impl Scripted {
    pub fn new<F>(work_pad: &Arc<WorkPad>, id: &str, body: F) -> Self
    where
        F: Fn(&TestCase) -> TestOutcome + Send + Sync + 'static,
    {
        Self {
            tc: TestCase::new(work_pad, test_case_identity(id)).unwrap(),
            body: Box::new(body),
        }
    }

    pub fn boxed<F>(work_pad: &Arc<WorkPad>, id: &str, body: F) -> Box<dyn ConformanceTestCase>
    where
        F: Fn(&TestCase) -> TestOutcome + Send + Sync + 'static,
    {
        Box::new(Self::new(work_pad, id, body))
    }
}

impl ConformanceTestCase for Scripted {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        (self.body)(&self.tc)
    }
}
