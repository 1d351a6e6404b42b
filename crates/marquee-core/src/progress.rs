//! Progress reporting for harvest runs.
//!
//! The stages and the orchestrator emit [`HarvestEvent`]s through a
//! [`ProgressReporter`] instead of logging directly, so the CLI, tests and
//! any future frontend can decide what to show.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::FailurePolicy;
use crate::detail::DetailKind;
use crate::error::AppError;
use crate::models::EntityId;
use crate::sync::{CycleSummary, DiscoveryReport, StageStats};

/// Events emitted during a harvest.
#[derive(Debug, Clone)]
pub enum HarvestEvent<'a> {
    /// A cycle is starting.
    CycleStarted { cycle: u32, total: u32 },
    /// Discovery is about to fetch `first_page..=last_page`.
    DiscoveryStarted { first_page: u32, last_page: u32 },
    /// A listing page was fetched.
    PageFetched { page: u32, ids: usize },
    /// A listing page failed; it contributes no ids and is not retried.
    PageFailed { page: u32, error: &'a AppError },
    /// Discovery advanced and saved the checkpoint.
    DiscoveryCompleted { report: &'a DiscoveryReport },
    /// A detail stage computed its work list.
    StageStarted {
        stage: DetailKind,
        pending: usize,
        already_stored: usize,
    },
    /// A detail record was fetched and appended.
    RecordFetched { stage: DetailKind, id: EntityId },
    /// A detail fetch failed.
    RecordFailed {
        stage: DetailKind,
        id: EntityId,
        error: &'a AppError,
        policy: FailurePolicy,
    },
    /// A detail collection was saved mid-stage.
    StageFlushed { stage: DetailKind, records: usize },
    /// A detail stage finished and saved its collection.
    StageCompleted {
        stage: DetailKind,
        stats: &'a StageStats,
    },
    /// A cycle finished all three stages.
    CycleCompleted {
        cycle: u32,
        summary: &'a CycleSummary,
    },
    /// A cycle was aborted.
    CycleFailed { cycle: u32, error: &'a AppError },
    /// The schedule is pausing before the next cycle.
    Sleeping { pause: Duration },
}

/// Trait for reporting harvest events.
pub trait ProgressReporter: Send + Sync {
    /// Called when a harvest event occurs.
    ///
    /// The default implementation does nothing (silent mode).
    fn report(&self, event: HarvestEvent<'_>) {
        let _ = event;
    }
}

/// Silent reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Tracing-based reporter for CLI logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: HarvestEvent<'_>) {
        match event {
            HarvestEvent::CycleStarted { cycle, total } => {
                info!(cycle, total, "Running cycle {}/{}", cycle, total);
            }
            HarvestEvent::DiscoveryStarted {
                first_page,
                last_page,
            } => {
                info!(first_page, last_page, "Discovering movie ids");
            }
            HarvestEvent::PageFetched { page, ids } => {
                info!(page, ids, "Saving movies from the page");
            }
            HarvestEvent::PageFailed { page, error } => {
                warn!(page, error = %error, "Failed to list movies on page");
            }
            HarvestEvent::DiscoveryCompleted { report } => {
                info!(
                    next_page = report.next_page,
                    discovered = report.ids_discovered,
                    failed_pages = report.pages_failed,
                    backlog = report.backlog_len,
                    "Checkpoint advanced"
                );
            }
            HarvestEvent::StageStarted {
                stage,
                pending,
                already_stored,
            } => {
                info!(%stage, pending, already_stored, "Detail stage started");
            }
            HarvestEvent::RecordFetched { stage, id } => {
                debug!(%stage, id, "Record fetched");
            }
            HarvestEvent::RecordFailed {
                stage,
                id,
                error,
                policy,
            } => {
                warn!(
                    %stage,
                    id,
                    error = %error,
                    transient = error.is_transient(),
                    %policy,
                    "Failed to fetch record"
                );
            }
            HarvestEvent::StageFlushed { stage, records } => {
                debug!(%stage, records, "Collection flushed");
            }
            HarvestEvent::StageCompleted { stage, stats } => {
                info!(
                    %stage,
                    already_stored = stats.already_stored,
                    fetched = stats.fetched,
                    failed = stats.failed,
                    placeholders = stats.placeholders,
                    "Detail stage completed"
                );
            }
            HarvestEvent::CycleCompleted { cycle, summary } => {
                info!(
                    cycle,
                    discovered = summary.discovery.ids_discovered,
                    unique_ids = summary.unique_ids,
                    credits_fetched = summary.credits.fetched,
                    movies_fetched = summary.movies.fetched,
                    "Cycle completed"
                );
            }
            HarvestEvent::CycleFailed { cycle, error } => {
                if error.is_page_limit() {
                    info!(cycle, "{}", error);
                } else {
                    warn!(cycle, error = %error, "Cycle aborted");
                }
            }
            HarvestEvent::Sleeping { pause } => {
                info!(pause_secs = pause.as_secs(), "Sleeping before next cycle");
            }
        }
    }
}
