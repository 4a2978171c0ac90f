//! Repository workbench
//!
//! A sample workbench that checks a `MetadataRepository` against three
//! profiles:
//!
//! | id | profile                      | priority  |
//! |----|------------------------------|-----------|
//! | 0  | Metadata repository services | MANDATORY |
//! | 1  | Type definition services     | OPTIONAL  |
//! | 2  | Event notification           | OPTIONAL  |

use conformance_report::ProfilePriority;
use std::collections::BTreeMap;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

use super::repository::MetadataRepository;
use super::state::{EntityDetail, RepositoryError, RepositoryEvent};
use crate::error::Result;
use crate::profiles::{ProfileDefinition, RequirementDefinition, StaticProfileCatalog};
use crate::test_case::{
    Assertion, ConformanceTestCase, TestCase, TestCaseIdentity, TestFailure, TestOutcome,
    TestPhase,
};
use crate::work_pad::{WorkPad, WorkbenchIdentity};

pub const WORKBENCH_ID: &str = "repository-workbench";
pub const WORKBENCH_NAME: &str = "Repository Workbench";
pub const WORKBENCH_VERSION: &str = "1.0";
const DOCS_ROOT: &str = "https://example.org/conformance/repository-workbench";

pub const PROFILE_REPOSITORY_SERVICES: u32 = 0;
pub const PROFILE_TYPE_DEFS: u32 = 1;
pub const PROFILE_EVENTS: u32 = 2;

pub const REQ_ENTITY_CREATE: u32 = 0;
pub const REQ_ENTITY_RETRIEVE: u32 = 1;
pub const REQ_ENTITY_SEARCH: u32 = 2;
pub const REQ_PAGED_SEARCH: u32 = 3;
pub const REQ_ERROR_REPORTING: u32 = 4;
pub const REQ_TYPE_DEF_RETRIEVAL: u32 = 0;
pub const REQ_ENTITY_EVENTS: u32 = 0;

const ASSET: &str = "Asset";
const LISTENER_TICK: Duration = Duration::from_millis(250);

pub fn workbench_identity() -> WorkbenchIdentity {
    WorkbenchIdentity::new(WORKBENCH_ID, WORKBENCH_NAME, WORKBENCH_VERSION, DOCS_ROOT)
}

fn doc(anchor: &str) -> String {
    format!("{}#{}", DOCS_ROOT, anchor)
}

pub fn profile_catalog() -> StaticProfileCatalog {
    StaticProfileCatalog::new(vec![
        ProfileDefinition::new(
            PROFILE_REPOSITORY_SERVICES,
            "Metadata repository services",
            ProfilePriority::Mandatory,
        )
        .with_description("Store, retrieve and search metadata instances")
        .with_documentation_url(doc("repository-services"))
        .with_requirement(
            RequirementDefinition::new(REQ_ENTITY_CREATE, "Entity creation")
                .with_description("New entities are stored with a unique guid"),
        )
        .with_requirement(
            RequirementDefinition::new(REQ_ENTITY_RETRIEVE, "Entity retrieval")
                .with_description("Stored entities can be read back by guid"),
        )
        .with_requirement(
            RequirementDefinition::new(REQ_ENTITY_SEARCH, "Entity search")
                .with_description("Entities can be found by qualified name pattern"),
        )
        .with_requirement(
            RequirementDefinition::new(REQ_PAGED_SEARCH, "Paged search")
                .with_description("Search results honour offset and page size"),
        )
        .with_requirement(
            RequirementDefinition::new(REQ_ERROR_REPORTING, "Error reporting")
                .with_description("Requests for unknown instances fail with a typed error"),
        ),
        ProfileDefinition::new(
            PROFILE_TYPE_DEFS,
            "Type definition services",
            ProfilePriority::Optional,
        )
        .with_description("Expose the supported type system")
        .with_documentation_url(doc("type-definitions"))
        .with_requirement(RequirementDefinition::new(
            REQ_TYPE_DEF_RETRIEVAL,
            "Type definition retrieval",
        )),
        ProfileDefinition::new(PROFILE_EVENTS, "Event notification", ProfilePriority::Optional)
            .with_description("Publish change events for metadata instances")
            .with_documentation_url(doc("events"))
            .with_requirement(RequirementDefinition::new(
                REQ_ENTITY_EVENTS,
                "Entity change events",
            )),
    ])
}

/// Create and register every test case of the workbench on `work_pad`.
pub fn test_cases(
    work_pad: &Arc<WorkPad>,
    repository: Arc<dyn MetadataRepository>,
    event_timeout: Duration,
) -> Result<Vec<Box<dyn ConformanceTestCase>>> {
    let identity = |id: &str, name: &str, profile: u32, requirement: u32| {
        TestCaseIdentity::new(id, name, doc(id), profile, requirement)
    };

    let mut cases: Vec<Box<dyn ConformanceTestCase>> = Vec::new();
    cases.push(Box::new(AddEntityTestCase {
        tc: TestCase::new(
            work_pad,
            identity(
                "repo-add-entity-001",
                "Create, retrieve and delete an entity",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_CREATE,
            ),
        )?,
        repository: Arc::clone(&repository),
        created: Mutex::new(None),
    }));
    cases.push(Box::new(FindEntitiesTestCase {
        tc: TestCase::new(
            work_pad,
            identity(
                "repo-find-entities-001",
                "Find entities by qualified name",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_SEARCH,
            ),
        )?,
        repository: Arc::clone(&repository),
        created: Mutex::new(Vec::new()),
    }));
    cases.push(Box::new(EntityNotKnownTestCase {
        tc: TestCase::new(
            work_pad,
            identity(
                "repo-entity-not-known-001",
                "Unknown guid is reported as not known",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ERROR_REPORTING,
            ),
        )?,
        repository: Arc::clone(&repository),
    }));
    cases.push(Box::new(TypeDefsTestCase {
        tc: TestCase::new(
            work_pad,
            identity(
                "repo-type-defs-001",
                "Retrieve type definitions",
                PROFILE_TYPE_DEFS,
                REQ_TYPE_DEF_RETRIEVAL,
            ),
        )?,
        repository: Arc::clone(&repository),
    }));
    cases.push(Box::new(EntityEventTestCase {
        tc: TestCase::new(
            work_pad,
            identity(
                "event-new-entity-001",
                "New entity event is published",
                PROFILE_EVENTS,
                REQ_ENTITY_EVENTS,
            ),
        )?,
        repository,
        event_timeout,
        created: Mutex::new(None),
        listener: Mutex::new(None),
    }));
    Ok(cases)
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, u64) {
    let started = Instant::now();
    let value = f();
    (value, started.elapsed().as_millis() as u64)
}

fn qualified_name(test_case_id: &str, suffix: &str) -> String {
    format!("conformance::{}::{}", test_case_id, suffix)
}

/// Phased: SEED creates, EXECUTE retrieves, CLEAN deletes.
struct AddEntityTestCase {
    tc: TestCase,
    repository: Arc<dyn MetadataRepository>,
    created: Mutex<Option<EntityDetail>>,
}

impl AddEntityTestCase {
    fn created(&self) -> Option<EntityDetail> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn seed(&self) -> TestOutcome {
        let name = qualified_name(self.tc.id(), "entity");
        let (result, ms) = timed(|| self.repository.add_entity(ASSET, &name, BTreeMap::new()));
        let entity = result.map_err(|e| TestFailure::unexpected_in("addEntity", &e))?;

        self.tc.assert_condition(
            !entity.guid.is_empty(),
            Assertion::new(
                "repo-add-entity-001-01",
                "new entity has a guid",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_CREATE,
            )
            .timed("addEntity", ms),
        )?;
        self.tc.verify_condition(
            entity.type_name == ASSET && entity.qualified_name == name,
            Assertion::new(
                "repo-add-entity-001-02",
                "new entity keeps its type and qualified name",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_CREATE,
            ),
        );

        *self.created.lock().unwrap_or_else(PoisonError::into_inner) = Some(entity);
        Ok(())
    }

    fn execute(&self) -> TestOutcome {
        let Some(entity) = self.created() else {
            return Ok(());
        };

        let (result, ms) = timed(|| self.repository.get_entity_detail(&entity.guid));
        let fetched = result.map_err(|e| TestFailure::unexpected_in("getEntityDetail", &e))?;

        self.tc.verify_condition(
            fetched == entity,
            Assertion::new(
                "repo-add-entity-001-03",
                "retrieved entity matches the created entity",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_RETRIEVE,
            )
            .timed("getEntityDetail", ms),
        );
        Ok(())
    }

    fn clean(&self) -> TestOutcome {
        let Some(entity) = self.created() else {
            return Ok(());
        };

        let (result, ms) = timed(|| self.repository.delete_entity(&entity.guid));
        let deleted = result.map_err(|e| TestFailure::unexpected_in("deleteEntity", &e))?;
        *self.created.lock().unwrap_or_else(PoisonError::into_inner) = None;

        self.tc.verify_condition(
            deleted.guid == entity.guid,
            Assertion::new(
                "repo-add-entity-001-04",
                "entity can be deleted",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_CREATE,
            )
            .timed("deleteEntity", ms),
        );

        let gone = matches!(
            self.repository.get_entity_detail(&entity.guid),
            Err(RepositoryError::EntityNotKnown { .. })
        );
        self.tc.verify_condition(
            gone,
            Assertion::new(
                "repo-add-entity-001-05",
                "deleted entity is no longer retrievable",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_RETRIEVE,
            ),
        );

        if self.tc.is_test_passed() {
            self.tc
                .set_success_message("Entities can be created, retrieved and deleted");
        }
        Ok(())
    }
}

impl ConformanceTestCase for AddEntityTestCase {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        for phase in TestPhase::all() {
            self.run_phase(*phase)?;
        }
        Ok(())
    }

    fn run_phase(&self, phase: TestPhase) -> TestOutcome {
        match phase {
            TestPhase::Seed => self.seed(),
            TestPhase::Execute => self.execute(),
            TestPhase::Clean => self.clean(),
        }
    }

    fn is_phased(&self) -> bool {
        true
    }

    fn cleanup(&self) -> TestOutcome {
        if let Some(entity) = self.created() {
            self.repository
                .delete_entity(&entity.guid)
                .map_err(|e| TestFailure::unexpected_in("deleteEntity", &e))?;
        }
        Ok(())
    }
}

/// Seeds a few entities, then checks search and paging.
struct FindEntitiesTestCase {
    tc: TestCase,
    repository: Arc<dyn MetadataRepository>,
    created: Mutex<Vec<String>>,
}

const FIND_SEED_COUNT: usize = 3;

impl ConformanceTestCase for FindEntitiesTestCase {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        let id = self.tc.id();
        for i in 0..FIND_SEED_COUNT {
            let entity = self
                .repository
                .add_entity(ASSET, &qualified_name(id, &format!("{:02}", i)), BTreeMap::new())
                .map_err(|e| TestFailure::unexpected_in("addEntity", &e))?;
            self.created
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entity.guid);
        }

        let search = format!("^conformance::{}::", regex_lite::escape(id));
        let max_page_size = self.tc.work_pad().max_page_size();
        self.tc.add_discovered_property(
            "serverName",
            self.repository.server_name(),
            PROFILE_REPOSITORY_SERVICES,
            REQ_ENTITY_SEARCH,
        );
        self.tc.add_discovered_property(
            "maxPageSize",
            max_page_size,
            PROFILE_REPOSITORY_SERVICES,
            REQ_PAGED_SEARCH,
        );

        let (result, ms) =
            timed(|| self.repository.find_entities(Some(ASSET), &search, 0, max_page_size));
        let all = result.map_err(|e| TestFailure::unexpected_in("findEntities", &e))?;
        self.tc.assert_condition(
            all.len() == FIND_SEED_COUNT,
            Assertion::new(
                "repo-find-entities-001-01",
                "search returns every matching entity",
                PROFILE_REPOSITORY_SERVICES,
                REQ_ENTITY_SEARCH,
            )
            .timed("findEntities", ms),
        )?;

        let first = self
            .repository
            .find_entities(Some(ASSET), &search, 0, 2)
            .map_err(|e| TestFailure::unexpected_in("findEntities", &e))?;
        let second = self
            .repository
            .find_entities(Some(ASSET), &search, 2, 2)
            .map_err(|e| TestFailure::unexpected_in("findEntities", &e))?;

        self.tc.verify_condition(
            first.len() == 2,
            Assertion::new(
                "repo-find-entities-001-02",
                "first page honours the page size",
                PROFILE_REPOSITORY_SERVICES,
                REQ_PAGED_SEARCH,
            ),
        );
        self.tc.verify_condition(
            second.len() == 1 && second[0].guid == all[2].guid,
            Assertion::new(
                "repo-find-entities-001-03",
                "second page continues from the offset",
                PROFILE_REPOSITORY_SERVICES,
                REQ_PAGED_SEARCH,
            ),
        );

        if self.tc.is_test_passed() {
            self.tc
                .set_success_message("Search and paging behave as expected");
        }
        Ok(())
    }

    fn cleanup(&self) -> TestOutcome {
        let guids: Vec<String> = self
            .created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for guid in guids {
            self.repository
                .delete_entity(&guid)
                .map_err(|e| TestFailure::unexpected_in("deleteEntity", &e))?;
        }
        Ok(())
    }
}

struct EntityNotKnownTestCase {
    tc: TestCase,
    repository: Arc<dyn MetadataRepository>,
}

impl ConformanceTestCase for EntityNotKnownTestCase {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        let guid = ulid::Ulid::new().to_string().to_lowercase();
        let (result, ms) = timed(|| self.repository.get_entity_detail(&guid));
        let assertion = Assertion::new(
            "repo-entity-not-known-001-01",
            "unknown guid fails with entity-not-known",
            PROFILE_REPOSITORY_SERVICES,
            REQ_ERROR_REPORTING,
        )
        .timed("getEntityDetail", ms);

        match result {
            Err(RepositoryError::EntityNotKnown { .. }) => {
                self.tc.verify_condition(true, assertion);
                Ok(())
            }
            Ok(_) => {
                self.tc.verify_condition(false, assertion);
                Ok(())
            }
            Err(e) => Err(TestFailure::unexpected_in("getEntityDetail", &e)),
        }
    }
}

struct TypeDefsTestCase {
    tc: TestCase,
    repository: Arc<dyn MetadataRepository>,
}

impl ConformanceTestCase for TypeDefsTestCase {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        let (result, ms) = timed(|| self.repository.find_type_defs());
        let defs = match result {
            Ok(defs) => defs,
            Err(e) if e.is_not_supported() => {
                self.tc.add_not_supported_assertion(
                    Assertion::new(
                        "repo-type-defs-001-00",
                        "type definition retrieval is not supported",
                        PROFILE_TYPE_DEFS,
                        REQ_TYPE_DEF_RETRIEVAL,
                    )
                    .timed("findTypeDefs", ms),
                );
                return Ok(());
            }
            Err(e) => return Err(TestFailure::unexpected_in("findTypeDefs", &e)),
        };

        self.tc.assert_condition(
            !defs.is_empty(),
            Assertion::new(
                "repo-type-defs-001-01",
                "repository returns type definitions",
                PROFILE_TYPE_DEFS,
                REQ_TYPE_DEF_RETRIEVAL,
            )
            .timed("findTypeDefs", ms),
        )?;
        self.tc.add_discovered_property(
            "typeDefCount",
            defs.len(),
            PROFILE_TYPE_DEFS,
            REQ_TYPE_DEF_RETRIEVAL,
        );

        let dangling: Vec<&str> = defs
            .iter()
            .filter_map(|d| d.super_type.as_deref())
            .filter(|s| !defs.iter().any(|d| d.name == *s))
            .collect();
        self.tc.verify_condition(
            dangling.is_empty(),
            Assertion::new(
                "repo-type-defs-001-02",
                "every super type is itself defined",
                PROFILE_TYPE_DEFS,
                REQ_TYPE_DEF_RETRIEVAL,
            ),
        );
        Ok(())
    }
}

/// Asynchronous: a listener thread waits for the NEW_ENTITY event.
struct EntityEventTestCase {
    tc: TestCase,
    repository: Arc<dyn MetadataRepository>,
    event_timeout: Duration,
    created: Mutex<Option<String>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl ConformanceTestCase for EntityEventTestCase {
    fn test_case(&self) -> &TestCase {
        &self.tc
    }

    fn run(&self) -> TestOutcome {
        let events = self.repository.subscribe();
        self.tc.start_asynchronous_test();

        let entity = self
            .repository
            .add_entity(ASSET, &qualified_name(self.tc.id(), "entity"), BTreeMap::new())
            .map_err(|e| TestFailure::unexpected_in("addEntity", &e))?;
        *self.created.lock().unwrap_or_else(PoisonError::into_inner) = Some(entity.guid.clone());

        let tc = self.tc.clone();
        let timeout = self.event_timeout;
        // keeps the pad from going quiet while the event is outstanding
        let tick = (self.tc.work_pad().quiescence() / 2)
            .clamp(Duration::from_millis(1), LISTENER_TICK);
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let assertion = Assertion::new(
                "event-new-entity-001-01",
                "NEW_ENTITY event received for the created entity",
                PROFILE_EVENTS,
                REQ_ENTITY_EVENTS,
            );

            loop {
                let remaining = timeout.saturating_sub(started.elapsed());
                match events.recv_timeout(remaining.min(tick)) {
                    Ok(event) => {
                        tc.work_pad().register_activity();
                        if let RepositoryEvent::NewEntity { entity: seen } = &event {
                            if seen.guid == entity.guid {
                                let ms = started.elapsed().as_millis() as u64;
                                tc.verify_condition(true, assertion.timed("eventListener", ms));
                                break;
                            }
                        }
                        debug!(
                            test_case_id = %tc.id(),
                            guid = %event.entity().guid,
                            "ignoring unrelated event"
                        );
                    }
                    Err(RecvTimeoutError::Timeout) if started.elapsed() < timeout => {
                        tc.work_pad().register_activity();
                    }
                    Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                        tc.work_pad().register_activity();
                        tc.verify_condition(false, assertion);
                        break;
                    }
                }
            }
            tc.end_asynchronous_test();
        });
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn cleanup(&self) -> TestOutcome {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // Bounded by the event timeout
            let _ = handle.join();
        }

        let guid = self
            .created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(guid) = guid {
            self.repository
                .delete_entity(&guid)
                .map_err(|e| TestFailure::unexpected_in("deleteEntity", &e))?;
        }
        Ok(())
    }
}
