//! Fixed enumerations shared by every conformance report.
//!
//! Each enum carries a stable ordinal, a display name and a description.
//! Ordinals are part of the persisted form and must not be renumbered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an enum from its constant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Conformance verdict for a profile or requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConformanceStatus {
    /// No evidence has been gathered yet
    #[serde(rename = "UNKNOWN_STATUS")]
    Unknown,
    /// Every function exercised behaved correctly
    #[serde(rename = "CONFORMANT_FULL_SUPPORT")]
    ConformantFullSupport,
    /// Supported functions behaved correctly; some were reported as unsupported
    #[serde(rename = "CONFORMANT_PARTIAL_SUPPORT")]
    ConformantPartialSupport,
    /// The technology correctly reported that it supports none of the functions
    #[serde(rename = "CONFORMANT_NO_SUPPORT")]
    ConformantNoSupport,
    /// At least one function behaved incorrectly
    #[serde(rename = "NOT_CONFORMANT")]
    NotConformant,
}

impl ConformanceStatus {
    /// All statuses in ordinal order.
    pub fn all() -> &'static [ConformanceStatus] {
        &[
            Self::Unknown,
            Self::ConformantFullSupport,
            Self::ConformantPartialSupport,
            Self::ConformantNoSupport,
            Self::NotConformant,
        ]
    }

    pub fn ordinal(&self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::ConformantFullSupport => 1,
            Self::ConformantPartialSupport => 2,
            Self::ConformantNoSupport => 3,
            Self::NotConformant => 4,
        }
    }

    /// Constant name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN_STATUS",
            Self::ConformantFullSupport => "CONFORMANT_FULL_SUPPORT",
            Self::ConformantPartialSupport => "CONFORMANT_PARTIAL_SUPPORT",
            Self::ConformantNoSupport => "CONFORMANT_NO_SUPPORT",
            Self::NotConformant => "NOT_CONFORMANT",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::ConformantFullSupport => "Conformant: full support",
            Self::ConformantPartialSupport => "Conformant: partial support",
            Self::ConformantNoSupport => "Conformant: no support",
            Self::NotConformant => "Not conformant",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "There is no evidence to determine conformance.",
            Self::ConformantFullSupport => {
                "The technology under test supports all of the functions and they behave correctly."
            }
            Self::ConformantPartialSupport => {
                "The technology under test supports some of the functions \
                 and they behave correctly."
            }
            Self::ConformantNoSupport => {
                "The technology under test correctly reports \
                 that it supports none of the functions."
            }
            Self::NotConformant => {
                "The technology under test does not behave as the profile requires."
            }
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.ordinal() == ordinal)
    }

    /// True for every conformant variant.
    pub fn is_conformant(&self) -> bool {
        matches!(
            self,
            Self::ConformantFullSupport | Self::ConformantPartialSupport | Self::ConformantNoSupport
        )
    }
}

impl fmt::Display for ConformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConformanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "conformance status",
                value: s.to_string(),
            })
    }
}

/// Whether a profile must be supported for the technology to be conformant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfilePriority {
    Mandatory,
    Optional,
}

impl ProfilePriority {
    pub fn all() -> &'static [ProfilePriority] {
        &[Self::Mandatory, Self::Optional]
    }

    pub fn ordinal(&self) -> u32 {
        match self {
            Self::Mandatory => 0,
            Self::Optional => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mandatory => "MANDATORY",
            Self::Optional => "OPTIONAL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mandatory => "Mandatory Profile",
            Self::Optional => "Optional Profile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Mandatory => "This profile must be supported by the technology under test.",
            Self::Optional => "This profile may be supported by the technology under test.",
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.ordinal() == ordinal)
    }
}

impl fmt::Display for ProfilePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProfilePriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "profile priority",
                value: s.to_string(),
            })
    }
}

/// Kind of fact captured by a single piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestEvidenceType {
    NoDataAvailable,
    SuccessfulAssertion,
    UnsuccessfulAssertion,
    DiscoveredProperty,
    NotSupportedFunction,
    UnexpectedException,
}

impl TestEvidenceType {
    pub fn all() -> &'static [TestEvidenceType] {
        &[
            Self::NoDataAvailable,
            Self::SuccessfulAssertion,
            Self::UnsuccessfulAssertion,
            Self::DiscoveredProperty,
            Self::NotSupportedFunction,
            Self::UnexpectedException,
        ]
    }

    pub fn ordinal(&self) -> u32 {
        match self {
            Self::NoDataAvailable => 0,
            Self::SuccessfulAssertion => 1,
            Self::UnsuccessfulAssertion => 2,
            Self::DiscoveredProperty => 3,
            Self::NotSupportedFunction => 4,
            Self::UnexpectedException => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDataAvailable => "NO_DATA_AVAILABLE",
            Self::SuccessfulAssertion => "SUCCESSFUL_ASSERTION",
            Self::UnsuccessfulAssertion => "UNSUCCESSFUL_ASSERTION",
            Self::DiscoveredProperty => "DISCOVERED_PROPERTY",
            Self::NotSupportedFunction => "NOT_SUPPORTED_FUNCTION",
            Self::UnexpectedException => "UNEXPECTED_EXCEPTION",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NoDataAvailable => "No data available",
            Self::SuccessfulAssertion => "Successful assertion",
            Self::UnsuccessfulAssertion => "Unsuccessful assertion",
            Self::DiscoveredProperty => "Discovered property",
            Self::NotSupportedFunction => "Function not supported",
            Self::UnexpectedException => "Unexpected exception",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NoDataAvailable => "The test case has not produced any evidence.",
            Self::SuccessfulAssertion => "An assertion made by the test case was true.",
            Self::UnsuccessfulAssertion => "An assertion made by the test case was false.",
            Self::DiscoveredProperty => {
                "The test case discovered a property of the technology under test."
            }
            Self::NotSupportedFunction => {
                "The technology under test correctly reported that a function is not supported."
            }
            Self::UnexpectedException => "The test case failed with an unexpected error.",
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.ordinal() == ordinal)
    }
}

impl fmt::Display for TestEvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TestEvidenceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "evidence type",
                value: s.to_string(),
            })
    }
}
