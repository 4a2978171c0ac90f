//! Profile taxonomy
//!
//! Each workbench defines its own profiles and requirements. The work pad
//! only needs the `ProfileCatalog` seam; `StaticProfileCatalog` covers the
//! common case of a fixed list of definitions.

use conformance_report::{
    Evidence, ProfilePriority, ProfileResults, ProfileSummary, RequirementResults,
};
use serde::{Deserialize, Serialize};

use crate::status::{process_evidence, status_from_evidence};

/// Workbench-specific profile taxonomy.
pub trait ProfileCatalog: Send + Sync {
    /// Profile names in report order.
    fn profile_names(&self) -> Vec<String>;

    /// Roll the evidence up into per-profile results.
    fn profile_results(&self, evidence: &[Evidence]) -> Vec<ProfileResults>;

    fn profile_summaries(&self, evidence: &[Evidence]) -> Vec<ProfileSummary> {
        self.profile_results(evidence)
            .iter()
            .map(ProfileResults::summary)
            .collect()
    }
}

/// A testable capability within a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

impl RequirementDefinition {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            documentation_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named, priority-tagged capability area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    pub id: u32,
    pub name: String,
    pub priority: ProfilePriority,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub requirements: Vec<RequirementDefinition>,
}

impl ProfileDefinition {
    pub fn new(id: u32, name: impl Into<String>, priority: ProfilePriority) -> Self {
        Self {
            id,
            name: name.into(),
            priority,
            description: None,
            documentation_url: None,
            requirements: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_documentation_url(mut self, url: impl Into<String>) -> Self {
        self.documentation_url = Some(url.into());
        self
    }

    pub fn with_requirement(mut self, requirement: RequirementDefinition) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Results for this profile computed from the full evidence list.
    ///
    /// The profile status covers all of its evidence, including evidence for
    /// requirement ids the definition does not list.
    pub fn results(&self, evidence: &[Evidence]) -> ProfileResults {
        let profile_evidence: Vec<&Evidence> =
            evidence.iter().filter(|e| e.is_for_profile(self.id)).collect();
        let profile_status =
            status_from_evidence(&process_evidence(profile_evidence.iter().copied()));

        let requirement_results = self
            .requirements
            .iter()
            .map(|req| {
                let (status, positive, negative) = process_evidence(
                    profile_evidence
                        .iter()
                        .copied()
                        .filter(|e| e.requirement_id == req.id),
                )
                .into_reported();

                RequirementResults {
                    requirement_id: req.id,
                    name: req.name.clone(),
                    description: req.description.clone(),
                    documentation_url: req.documentation_url.clone(),
                    conformance_status: status,
                    positive_test_evidence: positive,
                    negative_test_evidence: negative,
                }
            })
            .collect();

        ProfileResults {
            profile_id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            documentation_url: self.documentation_url.clone(),
            profile_priority: self.priority,
            conformance_status: profile_status,
            requirement_results,
        }
    }
}

/// Catalog backed by a fixed list of profile definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticProfileCatalog {
    profiles: Vec<ProfileDefinition>,
}

impl StaticProfileCatalog {
    pub fn new(profiles: Vec<ProfileDefinition>) -> Self {
        Self { profiles }
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileDefinition> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

impl ProfileCatalog for StaticProfileCatalog {
    fn profile_names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    fn profile_results(&self, evidence: &[Evidence]) -> Vec<ProfileResults> {
        self.profiles.iter().map(|p| p.results(evidence)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conformance_report::{ConformanceStatus, TestEvidenceType};

    fn catalog() -> StaticProfileCatalog {
        StaticProfileCatalog::new(vec![
            ProfileDefinition::new(5, "Metadata sharing", ProfilePriority::Mandatory)
                .with_requirement(RequirementDefinition::new(2, "Entity search"))
                .with_requirement(RequirementDefinition::new(3, "Paging")),
            ProfileDefinition::new(6, "Type definitions", ProfilePriority::Optional)
                .with_requirement(RequirementDefinition::new(0, "Type def retrieval")),
        ])
    }

    fn evidence(ty: TestEvidenceType, profile: u32, requirement: u32) -> Evidence {
        Evidence::new(ty, profile, requirement, "tc", "Test case", "url", "A")
    }

    #[test]
    fn test_requirement_and_profile_status() {
        let items = vec![
            evidence(TestEvidenceType::SuccessfulAssertion, 5, 2),
            evidence(TestEvidenceType::UnsuccessfulAssertion, 5, 3),
            evidence(TestEvidenceType::NotSupportedFunction, 6, 0),
        ];

        let results = catalog().profile_results(&items);
        assert_eq!(results.len(), 2);

        let sharing = &results[0];
        assert_eq!(sharing.conformance_status, ConformanceStatus::NotConformant);
        assert_eq!(
            sharing.requirement_results[0].conformance_status,
            ConformanceStatus::ConformantFullSupport
        );
        assert_eq!(
            sharing.requirement_results[1].conformance_status,
            ConformanceStatus::NotConformant
        );

        let types = &results[1];
        assert_eq!(types.conformance_status, ConformanceStatus::ConformantNoSupport);
        // Not-supported evidence is reported alongside positive evidence
        assert_eq!(types.requirement_results[0].positive_test_evidence.len(), 1);
    }

    #[test]
    fn test_no_evidence_is_unknown() {
        let results = catalog().profile_results(&[]);
        assert!(results
            .iter()
            .all(|p| p.conformance_status == ConformanceStatus::Unknown));
    }

    #[test]
    fn test_names_and_summaries() {
        let catalog = catalog();
        assert_eq!(catalog.profile_names(), vec!["Metadata sharing", "Type definitions"]);
        assert!(catalog.profile("Type definitions").is_some());

        let summaries =
            catalog.profile_summaries(&[evidence(TestEvidenceType::DiscoveredProperty, 5, 2)]);
        assert_eq!(summaries[0].conformance_status, ConformanceStatus::ConformantFullSupport);
        assert_eq!(summaries[0].requirement_summaries[0].positive_evidence_count, 1);
        assert_eq!(
            summaries[0].requirement_summaries[1].conformance_status,
            ConformanceStatus::Unknown
        );
    }
}
