//! Metadata repository seam and its in-memory implementation.

use chrono::Utc;
use regex_lite::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::failure::{FailureConfig, RepositoryOperation};
use super::state::{
    default_type_defs, EntityDetail, RepositoryError, RepositoryEvent, RepositoryState, TypeDef,
};

/// Operations a workbench exercises on the technology under test.
pub trait MetadataRepository: Send + Sync {
    /// Name reported in test lab results.
    fn server_name(&self) -> &str;

    fn add_entity(
        &self,
        type_name: &str,
        qualified_name: &str,
        properties: BTreeMap<String, Value>,
    ) -> Result<EntityDetail, RepositoryError>;

    fn get_entity_detail(&self, guid: &str) -> Result<EntityDetail, RepositoryError>;

    /// Entities whose qualified name matches `search` (a regular expression),
    /// ordered by qualified name. `page_size` 0 means the repository maximum.
    fn find_entities(
        &self,
        type_name: Option<&str>,
        search: &str,
        from: usize,
        page_size: u32,
    ) -> Result<Vec<EntityDetail>, RepositoryError>;

    fn delete_entity(&self, guid: &str) -> Result<EntityDetail, RepositoryError>;

    fn find_type_defs(&self) -> Result<Vec<TypeDef>, RepositoryError>;

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> Receiver<RepositoryEvent>;
}

/// Largest page the mock repository will return
pub const MOCK_MAX_PAGE_SIZE: u32 = 1000;

/// In-memory metadata repository with switchable defects for negative testing.
#[derive(Debug)]
pub struct MockRepository {
    server_name: String,
    max_page_size: u32,
    type_defs: Option<Vec<TypeDef>>,
    publish_events: bool,
    ignore_paging_offset: bool,
    state: Mutex<RepositoryState>,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new("mock-repository")
    }
}

impl MockRepository {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            max_page_size: MOCK_MAX_PAGE_SIZE,
            type_defs: Some(default_type_defs()),
            publish_events: true,
            ignore_paging_offset: false,
            state: Mutex::new(RepositoryState::default()),
        }
    }

    /// Report `find_type_defs` as unsupported.
    pub fn without_type_defs(mut self) -> Self {
        self.type_defs = None;
        self
    }

    /// Stop publishing change events.
    pub fn without_events(mut self) -> Self {
        self.publish_events = false;
        self
    }

    /// Always return the first page, whatever offset is asked for.
    pub fn with_broken_paging(mut self) -> Self {
        self.ignore_paging_offset = true;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn inject_failure(&self, op: RepositoryOperation, config: FailureConfig) {
        self.state().injector.inject(op, config);
    }

    pub fn clear_failures(&self) {
        self.state().injector.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.state().entities.len()
    }

    fn state(&self) -> MutexGuard<'_, RepositoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn known_type(&self, type_name: &str) -> bool {
        match &self.type_defs {
            Some(defs) => defs.iter().any(|d| d.name == type_name),
            None => true,
        }
    }
}

impl MetadataRepository for MockRepository {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn add_entity(
        &self,
        type_name: &str,
        qualified_name: &str,
        properties: BTreeMap<String, Value>,
    ) -> Result<EntityDetail, RepositoryError> {
        if qualified_name.is_empty() {
            return Err(RepositoryError::InvalidParameter {
                parameter: "qualifiedName".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.known_type(type_name) {
            return Err(RepositoryError::TypeNotKnown {
                type_name: type_name.to_string(),
            });
        }

        let mut state = self.state();
        state.check(RepositoryOperation::AddEntity)?;

        let entity = EntityDetail {
            guid: ulid::Ulid::new().to_string().to_lowercase(),
            type_name: type_name.to_string(),
            qualified_name: qualified_name.to_string(),
            properties,
            version: 1,
            created_at: Utc::now(),
        };
        state.entities.insert(entity.guid.clone(), entity.clone());
        debug!(guid = %entity.guid, type_name, "entity added");

        if self.publish_events {
            state.publish(RepositoryEvent::NewEntity {
                entity: entity.clone(),
            });
        }
        Ok(entity)
    }

    fn get_entity_detail(&self, guid: &str) -> Result<EntityDetail, RepositoryError> {
        let mut state = self.state();
        state.check(RepositoryOperation::GetEntityDetail)?;
        state
            .entities
            .get(guid)
            .cloned()
            .ok_or_else(|| RepositoryError::EntityNotKnown {
                guid: guid.to_string(),
            })
    }

    fn find_entities(
        &self,
        type_name: Option<&str>,
        search: &str,
        from: usize,
        page_size: u32,
    ) -> Result<Vec<EntityDetail>, RepositoryError> {
        if page_size > self.max_page_size {
            return Err(RepositoryError::PagingError {
                page_size,
                max_page_size: self.max_page_size,
            });
        }
        let pattern = Regex::new(search).map_err(|e| RepositoryError::InvalidParameter {
            parameter: "searchCriteria".to_string(),
            reason: e.to_string(),
        })?;
        let page_size = if page_size == 0 {
            self.max_page_size
        } else {
            page_size
        };
        let from = if self.ignore_paging_offset { 0 } else { from };

        let mut state = self.state();
        state.check(RepositoryOperation::FindEntities)?;

        let mut matches: Vec<EntityDetail> = state
            .entities
            .values()
            .filter(|e| type_name.map_or(true, |t| e.type_name == t))
            .filter(|e| pattern.is_match(&e.qualified_name))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

        Ok(matches
            .into_iter()
            .skip(from)
            .take(page_size as usize)
            .collect())
    }

    fn delete_entity(&self, guid: &str) -> Result<EntityDetail, RepositoryError> {
        let mut state = self.state();
        state.check(RepositoryOperation::DeleteEntity)?;
        let entity = state
            .entities
            .remove(guid)
            .ok_or_else(|| RepositoryError::EntityNotKnown {
                guid: guid.to_string(),
            })?;
        debug!(guid = %entity.guid, "entity deleted");

        if self.publish_events {
            state.publish(RepositoryEvent::DeletedEntity {
                entity: entity.clone(),
            });
        }
        Ok(entity)
    }

    fn find_type_defs(&self) -> Result<Vec<TypeDef>, RepositoryError> {
        self.state().check(RepositoryOperation::FindTypeDefs)?;
        self.type_defs
            .clone()
            .ok_or_else(|| RepositoryError::FunctionNotSupported {
                operation: RepositoryOperation::FindTypeDefs.as_str().to_string(),
            })
    }

    fn subscribe(&self) -> Receiver<RepositoryEvent> {
        let (tx, rx) = mpsc::channel();
        self.state().subscribers.push(tx);
        rx
    }
}
