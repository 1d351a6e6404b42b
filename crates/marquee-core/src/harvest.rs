//! Harvest service: the cycle orchestrator.
//!
//! One cycle is Discovery followed by the Credits stage and the Movies
//! stage, strictly in that order and strictly sequential. A scheduled run
//! repeats the cycle a fixed number of times with a pause in between.
//!
//! # Architecture
//!
//! The [`HarvestService`] is generic over three traits:
//! - [`DocumentStore`] - where the checkpoint and both collections live
//! - [`CatalogClient`] - the remote movie catalog
//! - [`TokenSource`] - where the bearer credential comes from
//!
//! # Failure handling
//!
//! Per-page and per-record fetch failures never abort anything; the stages
//! report them and carry on. A missing credential, the page ceiling or a
//! store failure aborts the current cycle. [`HarvestService::run_schedule`]
//! reports the aborted cycle and moves on to the next one.

use chrono::Utc;
use serde::Serialize;

use crate::checkpoint::{discover, load_checkpoint};
use crate::config::HarvestConfig;
use crate::detail::{DetailKind, DetailStage};
use crate::ledger::{UniqueIds, seen_ids};
use crate::models::Document;
use crate::progress::{HarvestEvent, ProgressReporter, SilentReporter};
use crate::sync::{CycleResult, CycleSummary, ScheduleSummary};
use crate::traits::{CatalogClient, DocumentStore, TokenSource};
use crate::AppError;

/// Service running harvest cycles against a catalog.
///
/// # Type Parameters
///
/// * `S` - Document store implementation (e.g., `JsonFileStore`)
/// * `C` - Catalog client implementation (e.g., `TmdbClient`)
/// * `T` - Credential source (e.g., `StaticToken`)
///
/// # Example
///
/// ```ignore
/// use marquee_core::{HarvestService, TracingReporter};
///
/// let service = HarvestService::new(store, client, token);
/// let summary = service.run_schedule_with_progress(&TracingReporter).await;
/// println!("{} of {} cycles succeeded", summary.successful_count(), summary.total_cycles());
/// ```
pub struct HarvestService<S, C, T>
where
    S: DocumentStore,
    C: CatalogClient,
    T: TokenSource,
{
    store: S,
    client: C,
    tokens: T,
    config: HarvestConfig,
}

impl<S, C, T> Clone for HarvestService<S, C, T>
where
    S: DocumentStore,
    C: CatalogClient,
    T: TokenSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            client: self.client.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, C, T> HarvestService<S, C, T>
where
    S: DocumentStore,
    C: CatalogClient,
    T: TokenSource,
{
    /// Creates a new harvest service with default configuration.
    pub fn new(store: S, client: C, tokens: T) -> Self {
        Self::with_config(store, client, tokens, HarvestConfig::default())
    }

    /// Creates a harvest service with custom configuration.
    pub fn with_config(store: S, client: C, tokens: T, config: HarvestConfig) -> Self {
        Self {
            store,
            client,
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Runs a single cycle without progress reporting.
    pub async fn run_cycle(&self) -> Result<CycleSummary, AppError> {
        self.run_cycle_with_progress(1, 1, &SilentReporter).await
    }

    /// Runs one Discovery → Credits → Movies pass.
    ///
    /// `cycle` and `total` are only used for reporting.
    ///
    /// # Errors
    ///
    /// Returns the first cycle-fatal error:
    /// - the credential cannot be obtained
    /// - Discovery hit the page ceiling (`AppError::PageLimitReached`)
    /// - a collection could not be loaded or saved
    ///
    /// Stages after the failing one do not run.
    pub async fn run_cycle_with_progress<R: ProgressReporter>(
        &self,
        cycle: u32,
        total: u32,
        reporter: &R,
    ) -> Result<CycleSummary, AppError> {
        let started_at = Utc::now();
        reporter.report(HarvestEvent::CycleStarted { cycle, total });

        let credential = self.tokens.credential()?;

        let (checkpoint, discovery) = discover(
            &self.store,
            &self.client,
            &credential,
            &self.config.stores.checkpoint,
            &self.config.discovery,
            reporter,
        )
        .await?;

        let unique = UniqueIds::from_backlog(&checkpoint.data);
        tracing::debug!(
            backlog = checkpoint.data.len(),
            unique = unique.len(),
            "Derived unique ids"
        );

        let credits = DetailStage::new(DetailKind::Credits, &self.config)
            .run(&self.store, &self.client, &credential, &unique, reporter)
            .await?;

        let movies = DetailStage::new(DetailKind::Movies, &self.config)
            .run(&self.store, &self.client, &credential, &unique, reporter)
            .await?;

        let summary = CycleSummary {
            cycle,
            started_at,
            finished_at: Utc::now(),
            discovery,
            unique_ids: unique.len(),
            credits,
            movies,
        };
        reporter.report(HarvestEvent::CycleCompleted {
            cycle,
            summary: &summary,
        });

        Ok(summary)
    }

    /// Runs the configured number of cycles without progress reporting.
    pub async fn run_schedule(&self) -> ScheduleSummary {
        self.run_schedule_with_progress(&SilentReporter).await
    }

    /// Runs `config.cycles` cycles, pausing `config.pause` between them.
    ///
    /// A failed cycle is reported as [`HarvestEvent::CycleFailed`] and the
    /// schedule continues. There is no pause after the last cycle.
    pub async fn run_schedule_with_progress<R: ProgressReporter>(
        &self,
        reporter: &R,
    ) -> ScheduleSummary {
        let total = self.config.cycles;
        let mut schedule = ScheduleSummary::new();

        for cycle in 1..=total {
            match self.run_cycle_with_progress(cycle, total, reporter).await {
                Ok(summary) => schedule.add(CycleResult::success(summary)),
                Err(e) => {
                    reporter.report(HarvestEvent::CycleFailed { cycle, error: &e });
                    schedule.add(CycleResult::failure(cycle, &e));
                }
            }

            if cycle < total {
                reporter.report(HarvestEvent::Sleeping {
                    pause: self.config.pause,
                });
                tokio::time::sleep(self.config.pause).await;
            }
        }

        schedule
    }

    /// Reads the stored state without touching the network.
    pub async fn status(&self) -> Result<HarvestStatus, AppError> {
        let checkpoint = load_checkpoint(
            &self.store,
            &self.config.stores.checkpoint,
            &self.config.discovery,
        )
        .await?;
        let unique = UniqueIds::from_backlog(&checkpoint.data);

        let credits = self.collection_status(DetailKind::Credits, &unique).await?;
        let movies = self.collection_status(DetailKind::Movies, &unique).await?;

        Ok(HarvestStatus {
            initialized: self.store.exists(&self.config.stores.checkpoint).await?,
            page: checkpoint.page,
            pages_per_run: checkpoint.pages_per_run,
            max_pages: checkpoint.max_pages,
            backlog_len: checkpoint.data.len(),
            unique_ids: unique.len(),
            credits,
            movies,
        })
    }

    async fn collection_status(
        &self,
        kind: DetailKind,
        unique: &UniqueIds,
    ) -> Result<CollectionStatus, AppError> {
        let records: Vec<Document> = self
            .store
            .load(kind.collection(&self.config.stores), Vec::new())
            .await?;
        let seen = seen_ids(&records);
        Ok(CollectionStatus {
            stored: records.len(),
            pending: unique.missing_from(&seen.ids).len(),
        })
    }
}

/// Snapshot of the stored harvest state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestStatus {
    /// Whether a checkpoint has been saved yet.
    pub initialized: bool,
    pub page: u32,
    pub pages_per_run: u32,
    pub max_pages: u32,
    pub backlog_len: usize,
    pub unique_ids: usize,
    pub credits: CollectionStatus,
    pub movies: CollectionStatus,
}

impl HarvestStatus {
    /// Returns true once Discovery can no longer advance.
    pub fn is_exhausted(&self) -> bool {
        self.page >= self.max_pages
    }
}

/// Record counts for one detail collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    /// Records in the collection, placeholders included.
    pub stored: usize,
    /// Unique ids with no record yet.
    pub pending: usize,
}
