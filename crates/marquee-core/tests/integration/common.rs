//! Test utilities and mock implementations for integration tests.
//!
//! Provides in-memory implementations of the core traits for testing the
//! stages and `HarvestService` in isolation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use marquee_core::traits::{CatalogClient, DocumentStore, TokenSource};
use marquee_core::{
    AppError, Credential, DiscoveryConfig, Document, EntityId, HarvestConfig, HarvestEvent,
    ProgressReporter,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const CHECKPOINT: &str = "movies_ids.json";
pub const MOVIES: &str = "movies.json";
pub const CREDITS: &str = "credits.json";

/// Harvest config with a one-page batch and no pause between cycles.
pub fn test_config(cycles: u32) -> HarvestConfig {
    HarvestConfig::default()
        .with_cycles(cycles)
        .with_pause(Duration::ZERO)
        .with_discovery(DiscoveryConfig {
            start_page: 1,
            pages_per_run: 1,
            max_pages: 500,
        })
}

pub fn credential() -> Credential {
    Credential::new("test-token").unwrap()
}

// =============================================================================
// MockCatalogClient
// =============================================================================

/// One request made against the mock catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ListPage(u32),
    Detail(EntityId),
    Credits(EntityId),
}

#[derive(Default)]
struct CatalogState {
    pages: HashMap<u32, Vec<EntityId>>,
    failing_pages: HashSet<u32>,
    failing_details: HashSet<EntityId>,
    failing_credits: HashSet<EntityId>,
    redirects: HashMap<EntityId, EntityId>,
    omit_ids: bool,
    calls: Vec<Call>,
}

/// Mock catalog with configurable listing pages and failures.
///
/// Unconfigured pages list no ids. Detail and credits documents are
/// synthesized from the requested id. State is shared between clones, so a
/// test can change failures after handing the client to a service.
#[derive(Clone, Default)]
pub struct MockCatalogClient {
    state: Arc<Mutex<CatalogState>>,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: u32, ids: Vec<EntityId>) -> Self {
        self.state.lock().unwrap().pages.insert(page, ids);
        self
    }

    pub fn fail_page(&self, page: u32) {
        self.state.lock().unwrap().failing_pages.insert(page);
    }

    pub fn fail_detail(&self, id: EntityId) {
        self.state.lock().unwrap().failing_details.insert(id);
    }

    pub fn fail_credits(&self, id: EntityId) {
        self.state.lock().unwrap().failing_credits.insert(id);
    }

    /// Stops failing detail and credits requests for `id`.
    pub fn heal(&self, id: EntityId) {
        let mut state = self.state.lock().unwrap();
        state.failing_details.remove(&id);
        state.failing_credits.remove(&id);
    }

    /// Answer detail and credits requests for `requested` with the
    /// document of `served`, as the API does for merged entries.
    pub fn redirect(&self, requested: EntityId, served: EntityId) {
        self.state
            .lock()
            .unwrap()
            .redirects
            .insert(requested, served);
    }

    /// Serve documents without an `id` field.
    pub fn omit_ids(&self) {
        self.state.lock().unwrap().omit_ids = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn detail_calls(&self) -> Vec<EntityId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Detail(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn credits_calls(&self) -> Vec<EntityId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Credits(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn listed_pages(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListPage(page) => Some(page),
                _ => None,
            })
            .collect()
    }
}

impl CatalogClient for MockCatalogClient {
    async fn list_page(
        &self,
        _credential: &Credential,
        page: u32,
    ) -> Result<Vec<EntityId>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListPage(page));
        if state.failing_pages.contains(&page) {
            return Err(AppError::NetworkError(format!("page {} unreachable", page)));
        }
        Ok(state.pages.get(&page).cloned().unwrap_or_default())
    }

    async fn get_detail(
        &self,
        _credential: &Credential,
        id: EntityId,
    ) -> Result<Document, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Detail(id));
        if state.failing_details.contains(&id) {
            return Err(AppError::NotFound(format!("movie {}", id)));
        }
        let served = state.redirects.get(&id).copied().unwrap_or(id);
        let mut doc = json!({"id": served, "title": format!("Movie {}", served)});
        if state.omit_ids {
            doc.as_object_mut().unwrap().remove("id");
        }
        Ok(doc)
    }

    async fn get_related_set(
        &self,
        _credential: &Credential,
        id: EntityId,
    ) -> Result<Document, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Credits(id));
        if state.failing_credits.contains(&id) {
            return Err(AppError::Timeout(30));
        }
        let served = state.redirects.get(&id).copied().unwrap_or(id);
        let mut doc = json!({"id": served, "cast": [], "crew": []});
        if state.omit_ids {
            doc.as_object_mut().unwrap().remove("id");
        }
        Ok(doc)
    }
}

// =============================================================================
// MockDocumentStore
// =============================================================================

/// In-memory document store keeping each collection as a JSON value.
#[derive(Clone, Default)]
pub struct MockDocumentStore {
    documents: Arc<Mutex<HashMap<String, Value>>>,
    saves: Arc<Mutex<Vec<String>>>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection without counting it as a save.
    pub fn insert(&self, name: &str, value: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(name).cloned()
    }

    /// Returns the records of a collection, or an empty list.
    pub fn records(&self, name: &str) -> Vec<Value> {
        match self.get(name) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn record_ids(&self, name: &str) -> Vec<Option<u64>> {
        self.records(name)
            .iter()
            .map(|r| r.get("id").and_then(Value::as_u64))
            .collect()
    }

    pub fn save_count(&self, name: &str) -> usize {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }
}

impl DocumentStore for MockDocumentStore {
    async fn load<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let stored = self.get(name);
        match stored {
            Some(value) => serde_json::from_value(value).map_err(|e| AppError::CorruptDocument {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    async fn save<T>(&self, name: &str, document: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(document)?;
        self.insert(name, value);
        self.saves.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.documents.lock().unwrap().contains_key(name))
    }
}

// =============================================================================
// Token sources
// =============================================================================

/// Token source failing on the listed cycle numbers (1-based call count).
#[derive(Clone)]
pub struct FlakyToken {
    failing: HashSet<u32>,
    calls: Arc<AtomicU32>,
}

impl FlakyToken {
    pub fn failing_on(cycles: &[u32]) -> Self {
        Self {
            failing: cycles.iter().copied().collect(),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn always_ok() -> Self {
        Self::failing_on(&[])
    }
}

impl TokenSource for FlakyToken {
    fn credential(&self) -> Result<Credential, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.contains(&call) {
            return Err(AppError::MissingCredential("MOVIE_API_TOKEN".to_string()));
        }
        Ok(credential())
    }
}

// =============================================================================
// RecordingReporter
// =============================================================================

/// Reporter that records a short label per event.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: HarvestEvent<'_>) {
        let label = match event {
            HarvestEvent::CycleStarted { cycle, .. } => format!("cycle_started:{}", cycle),
            HarvestEvent::DiscoveryStarted { first_page, .. } => {
                format!("discovery_started:{}", first_page)
            }
            HarvestEvent::PageFetched { page, .. } => format!("page_fetched:{}", page),
            HarvestEvent::PageFailed { page, .. } => format!("page_failed:{}", page),
            HarvestEvent::DiscoveryCompleted { report } => {
                format!("discovery_completed:{}", report.next_page)
            }
            HarvestEvent::StageStarted { stage, .. } => format!("stage_started:{}", stage),
            HarvestEvent::RecordFetched { stage, id } => format!("record_fetched:{}:{}", stage, id),
            HarvestEvent::RecordFailed { stage, id, .. } => {
                format!("record_failed:{}:{}", stage, id)
            }
            HarvestEvent::StageFlushed { stage, records } => {
                format!("stage_flushed:{}:{}", stage, records)
            }
            HarvestEvent::StageCompleted { stage, .. } => format!("stage_completed:{}", stage),
            HarvestEvent::CycleCompleted { cycle, .. } => format!("cycle_completed:{}", cycle),
            HarvestEvent::CycleFailed { cycle, .. } => format!("cycle_failed:{}", cycle),
            HarvestEvent::Sleeping { .. } => "sleeping".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}
