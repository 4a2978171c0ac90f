//! Conformance Test Workbench Engine
//!
//! Runs conformance test cases against a technology under test and turns
//! what they observe into evidence:
//! - a `TestCase` records assertions, discovered properties and unexpected
//!   failures
//! - a `WorkPad` holds the evidence ledger of one workbench and rolls it up
//!   into per-profile and per-requirement conformance status
//! - a `TestLab` aggregates the work pads of a run into the report tree of
//!   the `conformance-report` crate

pub mod config;
pub mod error;
pub mod harness;
pub mod lab;
pub mod logging;
pub mod mock;
pub mod profiles;
pub mod report;
pub mod status;
pub mod test_case;
pub mod work_pad;

pub use conformance_report::{
    ConformanceStatus, Evidence, ExceptionDetail, ProfilePriority, TestEvidenceType,
};
pub use error::{ConformanceError, ErrorCode, Result};
pub use harness::{RunTally, WorkbenchRunner};
pub use lab::TestLab;
pub use profiles::{ProfileCatalog, ProfileDefinition, RequirementDefinition, StaticProfileCatalog};
pub use status::{process_evidence, status_from_evidence, EvidenceBuckets};
pub use test_case::{
    Assertion, ConformanceTestCase, TestCase, TestCaseIdentity, TestCaseLifecycle, TestFailure,
    TestOutcome, TestPhase,
};
pub use work_pad::{TutConnection, WorkPad, WorkbenchIdentity};
