//! Conformance Report Types
//!
//! Serializable report beans produced by the conformance test workbench.
//! Field names are camelCase on the wire, absent optional values are
//! omitted, and unknown fields are ignored on read.

pub mod enums;
pub mod evidence;
pub mod lab;
pub mod profile;
pub mod test_case;
pub mod workbench;

pub use enums::{ConformanceStatus, ParseEnumError, ProfilePriority, TestEvidenceType};
pub use evidence::{Evidence, ExceptionDetail};
pub use lab::{TestLabResults, TestLabSummary};
pub use profile::{ProfileResults, ProfileSummary, RequirementResults, RequirementSummary};
pub use test_case::{TestCaseResult, TestCaseSummary};
pub use workbench::{WorkbenchResults, WorkbenchStatus, WorkbenchSummary};
