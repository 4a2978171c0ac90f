//! Profile and requirement rollups.

use serde::{Deserialize, Serialize};

use crate::enums::{ConformanceStatus, ProfilePriority};
use crate::evidence::Evidence;

/// Full results for one requirement, including the evidence behind its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementResults {
    pub requirement_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "documentationURL", default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    pub conformance_status: ConformanceStatus,
    /// Positive evidence, with not-supported evidence folded in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positive_test_evidence: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negative_test_evidence: Vec<Evidence>,
}

impl RequirementResults {
    pub fn summary(&self) -> RequirementSummary {
        RequirementSummary {
            requirement_id: self.requirement_id,
            name: self.name.clone(),
            conformance_status: self.conformance_status,
            positive_evidence_count: self.positive_test_evidence.len(),
            negative_evidence_count: self.negative_test_evidence.len(),
        }
    }
}

/// Status of one requirement with evidence counts only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSummary {
    pub requirement_id: u32,
    pub name: String,
    pub conformance_status: ConformanceStatus,
    #[serde(default)]
    pub positive_evidence_count: usize,
    #[serde(default)]
    pub negative_evidence_count: usize,
}

/// Full results for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResults {
    pub profile_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "documentationURL", default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    pub profile_priority: ProfilePriority,
    pub conformance_status: ConformanceStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirement_results: Vec<RequirementResults>,
}

impl ProfileResults {
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            profile_id: self.profile_id,
            name: self.name.clone(),
            profile_priority: self.profile_priority,
            conformance_status: self.conformance_status,
            requirement_summaries: self
                .requirement_results
                .iter()
                .map(RequirementResults::summary)
                .collect(),
        }
    }

    /// A mandatory profile that is not conformant fails the whole lab.
    pub fn is_blocking(&self) -> bool {
        self.profile_priority == ProfilePriority::Mandatory
            && self.conformance_status == ConformanceStatus::NotConformant
    }
}

/// Profile rollup without the underlying evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub profile_id: u32,
    pub name: String,
    pub profile_priority: ProfilePriority,
    pub conformance_status: ConformanceStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirement_summaries: Vec<RequirementSummary>,
}

impl ProfileSummary {
    pub fn is_blocking(&self) -> bool {
        self.profile_priority == ProfilePriority::Mandatory
            && self.conformance_status == ConformanceStatus::NotConformant
    }
}
