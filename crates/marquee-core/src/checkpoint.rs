//! Discovery checkpoint and the stage that advances it.
//!
//! The checkpoint is the only state Discovery owns: a page cursor, the
//! batch width, a hard page ceiling and the raw backlog of every id seen so
//! far. Each invocation fetches exactly `pages_per_run` pages starting at the
//! cursor, appends whatever ids came back, moves the cursor forward by
//! `pages_per_run` and rewrites the checkpoint.
//!
//! ```text
//! page=1, pages_per_run=10      page=11, pages_per_run=10
//! data=[]                 ──▶   data=[ids from pages 1..=10]
//! ```
//!
//! The cursor advances even when pages fail: a failed page is logged and
//! skipped for good, never queued for a later attempt.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::DiscoveryConfig;
use crate::models::EntityId;
use crate::progress::{HarvestEvent, ProgressReporter};
use crate::sync::DiscoveryReport;
use crate::traits::{CatalogClient, DocumentStore};
use crate::{AppError, Credential};

/// Persisted discovery cursor plus the raw id backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Next page to fetch.
    pub page: u32,
    /// Pages fetched per Discovery invocation.
    pub pages_per_run: u32,
    /// Discovery refuses to run once `page` reaches this value.
    pub max_pages: u32,
    /// Every id discovered so far, in discovery order. Duplicates are kept.
    #[serde(default)]
    pub data: Vec<EntityId>,
}

impl Checkpoint {
    /// Creates a fresh checkpoint from the configured seed values.
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            page: config.start_page,
            pages_per_run: config.pages_per_run,
            max_pages: config.max_pages,
            data: Vec::new(),
        }
    }

    /// Returns true once the cursor has reached the page ceiling.
    pub fn is_exhausted(&self) -> bool {
        self.page >= self.max_pages
    }

    /// Pages the next invocation will fetch.
    pub fn next_pages(&self) -> Range<u32> {
        self.page..self.page.saturating_add(self.pages_per_run)
    }

    /// Checks that Discovery may run from this checkpoint.
    ///
    /// # Errors
    ///
    /// * `AppError::PageLimitReached` if the cursor is at or past `max_pages`
    /// * `AppError::ConfigError` if `pages_per_run` is zero (the cursor could never move)
    pub fn ensure_can_advance(&self) -> Result<(), AppError> {
        if self.is_exhausted() {
            return Err(AppError::PageLimitReached {
                page: self.page,
                max_pages: self.max_pages,
            });
        }
        if self.pages_per_run == 0 {
            return Err(AppError::ConfigError(
                "pages_per_run must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Moves the cursor past the pages just attempted.
    pub fn advance(&mut self) {
        self.page = self.page.saturating_add(self.pages_per_run);
    }
}

/// Loads the checkpoint, seeding a fresh one if none was saved yet.
pub async fn load_checkpoint<S: DocumentStore>(
    store: &S,
    collection: &str,
    defaults: &DiscoveryConfig,
) -> Result<Checkpoint, AppError> {
    store.load(collection, Checkpoint::new(defaults)).await
}

/// Runs one Discovery invocation and persists the advanced checkpoint.
///
/// Returns the updated checkpoint (so callers can derive the unique ids
/// without reading it back) together with a report of what happened.
///
/// # Errors
///
/// * `AppError::PageLimitReached` before any fetch when the cursor is at the
///   ceiling; the stored checkpoint is not touched
/// * store load/save failures
///
/// Per-page fetch failures are not errors: they are reported as
/// [`HarvestEvent::PageFailed`] and the page contributes no ids.
pub async fn discover<S, C, R>(
    store: &S,
    client: &C,
    credential: &Credential,
    collection: &str,
    defaults: &DiscoveryConfig,
    reporter: &R,
) -> Result<(Checkpoint, DiscoveryReport), AppError>
where
    S: DocumentStore,
    C: CatalogClient,
    R: ProgressReporter,
{
    let mut checkpoint = load_checkpoint(store, collection, defaults).await?;
    checkpoint.ensure_can_advance()?;

    let pages = checkpoint.next_pages();
    reporter.report(HarvestEvent::DiscoveryStarted {
        first_page: pages.start,
        last_page: pages.end - 1,
    });

    let mut report = DiscoveryReport::default();
    for page in pages {
        report.pages_requested += 1;
        match client.list_page(credential, page).await {
            Ok(ids) => {
                reporter.report(HarvestEvent::PageFetched {
                    page,
                    ids: ids.len(),
                });
                report.ids_discovered += ids.len();
                checkpoint.data.extend(ids);
            }
            Err(e) => {
                reporter.report(HarvestEvent::PageFailed { page, error: &e });
                report.pages_failed += 1;
            }
        }
    }

    checkpoint.advance();
    store.save(collection, &checkpoint).await?;

    report.next_page = checkpoint.page;
    report.backlog_len = checkpoint.data.len();
    reporter.report(HarvestEvent::DiscoveryCompleted { report: &report });

    Ok((checkpoint, report))
}
