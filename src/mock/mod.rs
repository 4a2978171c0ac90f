//! Mock technology under test
//!
//! An in-memory metadata repository and the sample repository workbench
//! that exercises it. Used by the `conformance-lab run` command and by the
//! integration tests.
//!
//! # Repository operations
//!
//! - `add_entity` / `get_entity_detail` / `delete_entity`
//! - `find_entities`: regex search over qualified names with offset paging
//! - `find_type_defs`: optional, can be switched off to exercise
//!   not-supported evidence
//! - `subscribe`: change events over an mpsc channel
//!
//! Defects can be switched on (`with_broken_paging`, `without_events`) or
//! injected per operation through the failure injector.

mod failure;
mod repository;
mod state;
pub mod workbench;

pub use failure::{FailureConfig, FailureInjector, RepositoryOperation};
pub use repository::{MetadataRepository, MockRepository, MOCK_MAX_PAGE_SIZE};
pub use state::{default_type_defs, EntityDetail, RepositoryError, RepositoryEvent, TypeDef};
