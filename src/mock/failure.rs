//! Failure injection for the mock repository
//!
//! Lets tests drive the error paths of a workbench: an injected failure makes
//! the named operation return `RepositoryError::Injected`, optionally only for
//! the first N calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Repository operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryOperation {
    AddEntity,
    GetEntityDetail,
    FindEntities,
    DeleteEntity,
    FindTypeDefs,
}

impl RepositoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryOperation::AddEntity => "addEntity",
            RepositoryOperation::GetEntityDetail => "getEntityDetail",
            RepositoryOperation::FindEntities => "findEntities",
            RepositoryOperation::DeleteEntity => "deleteEntity",
            RepositoryOperation::FindTypeDefs => "findTypeDefs",
        }
    }
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure configuration for one operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub message: String,
    /// Number of calls to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fail_count: None,
        }
    }

    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Per-operation failure table
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<RepositoryOperation, FailureConfig>,
    call_counts: HashMap<RepositoryOperation, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, op: RepositoryOperation, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Count the call and return the failure message if this call should fail.
    pub fn check(&mut self, op: RepositoryOperation) -> Option<String> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(limit) if *count > limit => None,
            _ => Some(config.message.clone()),
        }
    }

    pub fn call_count(&self, op: RepositoryOperation) -> u32 {
        self.call_counts.get(&op).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_injection() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(RepositoryOperation::FindEntities).is_none());
        assert_eq!(injector.call_count(RepositoryOperation::FindEntities), 0);
    }

    #[test]
    fn test_always_fail() {
        let mut injector = FailureInjector::new();
        injector.inject(
            RepositoryOperation::AddEntity,
            FailureConfig::error("repository offline"),
        );

        for _ in 0..3 {
            assert_eq!(
                injector.check(RepositoryOperation::AddEntity).as_deref(),
                Some("repository offline")
            );
        }
        assert!(injector.check(RepositoryOperation::DeleteEntity).is_none());
    }

    #[test]
    fn test_fail_count() {
        let mut injector = FailureInjector::new();
        injector.inject(
            RepositoryOperation::GetEntityDetail,
            FailureConfig::error("timeout").with_fail_count(2),
        );

        assert!(injector.check(RepositoryOperation::GetEntityDetail).is_some());
        assert!(injector.check(RepositoryOperation::GetEntityDetail).is_some());
        assert!(injector.check(RepositoryOperation::GetEntityDetail).is_none());
        assert_eq!(injector.call_count(RepositoryOperation::GetEntityDetail), 3);
    }

    #[test]
    fn test_clear() {
        let mut injector = FailureInjector::new();
        injector.inject(RepositoryOperation::FindTypeDefs, FailureConfig::error("x"));
        injector.clear();
        assert!(injector.check(RepositoryOperation::FindTypeDefs).is_none());
    }
}
