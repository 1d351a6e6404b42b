//! Marquee Core - Domain types, business logic, and services.
//!
//! This crate provides the core functionality for Marquee, a checkpointed
//! movie catalog harvester:
//!
//! - **Discovery**: [`checkpoint::discover`] walks the popularity listing a
//!   batch of pages at a time and keeps the raw id backlog in a [`Checkpoint`]
//! - **Dedup ledger**: [`UniqueIds`] collapses the backlog, [`seen_ids`] reads
//!   what a collection already holds
//! - **Detail stages**: [`DetailStage`] fetches credits and movie details for
//!   ids not yet stored
//! - **Services**: [`HarvestService`] runs cycles and scheduled runs
//! - **Traits**: [`CatalogClient`], [`DocumentStore`], [`TokenSource`] for dependency injection
//! - **Progress reporting**: [`ProgressReporter`] trait for decoupled logging/UI
//!
//! # Example
//!
//! ```ignore
//! use marquee_core::{HarvestConfig, HarvestService, TracingReporter};
//!
//! let service = HarvestService::with_config(store, client, token, HarvestConfig::default());
//! let summary = service.run_schedule_with_progress(&TracingReporter).await;
//! ```

pub mod checkpoint;
pub mod config;
pub mod credential;
pub mod detail;
pub mod error;
pub mod harvest;
pub mod ledger;
pub mod models;
pub mod progress;
pub mod sync;
pub mod traits;

// Configuration
pub use config::{
    CONFIG_FILE_NAME, DEFAULT_API_URL, DEFAULT_DATA_DIR, DiscoveryConfig, FailurePolicy,
    FileConfig, HarvestConfig, HttpConfig, StoreNames, default_config_path, load_file_config,
};

// Credentials
pub use credential::{Credential, EnvTokenSource, StaticToken, TOKEN_ENV_VAR};

// Error handling
pub use error::AppError;

// Domain models
pub use checkpoint::Checkpoint;
pub use ledger::{SeenIds, UniqueIds, seen_ids};
pub use models::{Document, EntityId};

// Stages
pub use detail::{DetailKind, DetailStage};

// Outcomes and statistics
pub use sync::{
    CycleResult, CycleSummary, DiscoveryReport, FetchOutcome, ScheduleSummary, StageStats,
};

// Progress reporting
pub use progress::{HarvestEvent, ProgressReporter, SilentReporter, TracingReporter};

// Traits for dependency injection
pub use traits::{CatalogClient, DocumentStore, TokenSource};

// Services (generic over trait implementations)
pub use harvest::{CollectionStatus, HarvestService, HarvestStatus};
