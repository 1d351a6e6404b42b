//! Outcome and statistics types for harvest runs.
//!
//! Pure bookkeeping, decoupled from I/O and from how results are displayed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of fetching a single missing id in a detail stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The record was fetched and appended.
    Fetched,
    /// The fetch failed and nothing was appended.
    Failed,
    /// The fetch failed and a placeholder was appended.
    Placeholder,
}

/// Statistics for one detail stage run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub already_stored: usize,
    pub fetched: usize,
    pub failed: usize,
    pub placeholders: usize,
}

impl StageStats {
    /// Creates a new empty stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched => self.fetched += 1,
            FetchOutcome::Failed => self.failed += 1,
            FetchOutcome::Placeholder => self.placeholders += 1,
        }
    }

    /// Returns the number of candidates considered.
    pub fn total(&self) -> usize {
        self.already_stored + self.fetched + self.failed + self.placeholders
    }

    /// Returns the number of records appended to the collection.
    pub fn appended(&self) -> usize {
        self.fetched + self.placeholders
    }
}

/// What one Discovery invocation did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Number of listing pages requested.
    pub pages_requested: u32,
    /// Pages whose request failed and contributed no ids.
    pub pages_failed: u32,
    /// Ids appended to the backlog, duplicates included.
    pub ids_discovered: usize,
    /// Cursor value after the run.
    pub next_page: u32,
    /// Backlog length after the run.
    pub backlog_len: usize,
}

/// Result of one full Discovery → Credits → Movies pass.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub discovery: DiscoveryReport,
    pub unique_ids: usize,
    pub credits: StageStats,
    pub movies: StageStats,
}

/// Outcome of one scheduled cycle.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub cycle: u32,
    pub summary: Option<CycleSummary>,
    pub error: Option<String>,
    /// The cycle stopped because Discovery hit its page ceiling.
    pub page_limit: bool,
}

impl CycleResult {
    /// Creates a result for a cycle that ran all stages.
    pub fn success(summary: CycleSummary) -> Self {
        Self {
            cycle: summary.cycle,
            summary: Some(summary),
            error: None,
            page_limit: false,
        }
    }

    /// Creates a result for an aborted cycle.
    pub fn failure(cycle: u32, error: &crate::AppError) -> Self {
        Self {
            cycle,
            summary: None,
            error: Some(error.to_string()),
            page_limit: error.is_page_limit(),
        }
    }

    /// Returns true if the cycle ran all stages.
    pub fn is_success(&self) -> bool {
        self.summary.is_some()
    }
}

/// Aggregated results of a scheduled run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSummary {
    pub results: Vec<CycleResult>,
}

impl ScheduleSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: CycleResult) {
        self.results.push(result);
    }

    pub fn total_cycles(&self) -> usize {
        self.results.len()
    }

    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Total ids added to the backlog across successful cycles.
    pub fn total_discovered(&self) -> usize {
        self.summaries().map(|s| s.discovery.ids_discovered).sum()
    }

    /// Total movie and credits records appended across successful cycles.
    pub fn total_appended(&self) -> usize {
        self.summaries()
            .map(|s| s.movies.appended() + s.credits.appended())
            .sum()
    }

    fn summaries(&self) -> impl Iterator<Item = &CycleSummary> {
        self.results.iter().filter_map(|r| r.summary.as_ref())
    }
}
