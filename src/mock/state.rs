//! Mock repository state: entities, type definitions and change events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

use super::failure::{FailureInjector, RepositoryOperation};

/// A metadata instance stored in the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    pub guid: String,
    pub type_name: String,
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// A type the repository knows how to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<String>,
    pub description: String,
}

impl TypeDef {
    fn new(name: &str, super_type: Option<&str>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            super_type: super_type.map(str::to_string),
            description: description.to_string(),
        }
    }
}

/// Type definitions the mock repository supports out of the box.
pub fn default_type_defs() -> Vec<TypeDef> {
    vec![
        TypeDef::new("Referenceable", None, "Anything with a unique qualified name"),
        TypeDef::new("Asset", Some("Referenceable"), "Something of value to the organization"),
        TypeDef::new("DataSet", Some("Asset"), "A collection of related data"),
        TypeDef::new("GlossaryTerm", Some("Referenceable"), "A business vocabulary entry"),
    ]
}

/// Change notification published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepositoryEvent {
    NewEntity { entity: EntityDetail },
    DeletedEntity { entity: EntityDetail },
}

impl RepositoryEvent {
    pub fn entity(&self) -> &EntityDetail {
        match self {
            RepositoryEvent::NewEntity { entity } | RepositoryEvent::DeletedEntity { entity } => {
                entity
            }
        }
    }
}

/// Errors raised by a metadata repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{operation} is not supported by this repository")]
    FunctionNotSupported { operation: String },

    #[error("Entity {guid} is not known to this repository")]
    EntityNotKnown { guid: String },

    #[error("Type {type_name} is not known to this repository")]
    TypeNotKnown { type_name: String },

    #[error("Invalid {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Page size {page_size} exceeds the repository limit of {max_page_size}")]
    PagingError { page_size: u32, max_page_size: u32 },

    #[error("{operation} failed: {message}")]
    Injected { operation: String, message: String },
}

impl RepositoryError {
    pub fn is_not_supported(&self) -> bool {
        matches!(self, RepositoryError::FunctionNotSupported { .. })
    }
}

/// Everything behind the mock repository's lock.
#[derive(Debug, Default)]
pub(crate) struct RepositoryState {
    pub(crate) entities: BTreeMap<String, EntityDetail>,
    pub(crate) subscribers: Vec<Sender<RepositoryEvent>>,
    pub(crate) injector: FailureInjector,
}

impl RepositoryState {
    /// Send to every live subscriber, dropping those whose receiver is gone.
    pub(crate) fn publish(&mut self, event: RepositoryEvent) {
        self.subscribers.retain(|s| s.send(event.clone()).is_ok());
    }

    pub(crate) fn check(&mut self, op: RepositoryOperation) -> Result<(), RepositoryError> {
        match self.injector.check(op) {
            Some(message) => Err(RepositoryError::Injected {
                operation: op.as_str().to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}
