//! Detail stages: fetch one record per id not yet in a collection.
//!
//! The same stage runs twice per cycle, once for credits and once for movie
//! details. It loads its collection, works out which unique ids are missing,
//! fetches them one at a time and appends the results. Records are never
//! updated: an id already present is done for good.

use std::fmt;

use crate::config::{FailurePolicy, HarvestConfig, StoreNames};
use crate::ledger::{UniqueIds, seen_ids};
use crate::models::{Document, EntityId, placeholder, stamp_id};
use crate::progress::{HarvestEvent, ProgressReporter};
use crate::sync::{FetchOutcome, StageStats};
use crate::traits::{CatalogClient, DocumentStore};
use crate::{AppError, Credential};

/// Which collection a detail stage fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    /// Movie detail documents (`GET /movie/{id}`).
    Movies,
    /// Credits documents (`GET /movie/{id}/credits`).
    Credits,
}

impl DetailKind {
    /// Collection name for this stage.
    pub fn collection<'a>(&self, names: &'a StoreNames) -> &'a str {
        match self {
            DetailKind::Movies => &names.movies,
            DetailKind::Credits => &names.credits,
        }
    }

    async fn fetch<C: CatalogClient>(
        &self,
        client: &C,
        credential: &Credential,
        id: EntityId,
    ) -> Result<Document, AppError> {
        match self {
            DetailKind::Movies => client.get_detail(credential, id).await,
            DetailKind::Credits => client.get_related_set(credential, id).await,
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailKind::Movies => write!(f, "movies"),
            DetailKind::Credits => write!(f, "credits"),
        }
    }
}

/// A configured detail stage.
#[derive(Debug, Clone)]
pub struct DetailStage {
    kind: DetailKind,
    collection: String,
    policy: FailurePolicy,
    flush_every: Option<usize>,
}

impl DetailStage {
    /// Creates the stage for `kind` using the harvest configuration.
    pub fn new(kind: DetailKind, config: &HarvestConfig) -> Self {
        Self {
            kind,
            collection: kind.collection(&config.stores).to_string(),
            policy: config.failure_policy,
            flush_every: config.flush_every,
        }
    }

    pub fn kind(&self) -> DetailKind {
        self.kind
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetches and appends every id in `ids` missing from the collection.
    ///
    /// The collection is saved after the last candidate, and additionally
    /// every `flush_every` appended records when configured.
    ///
    /// # Errors
    ///
    /// Only store failures abort the stage. Fetch failures are handled per
    /// the [`FailurePolicy`] and reported as [`HarvestEvent::RecordFailed`].
    pub async fn run<S, C, R>(
        &self,
        store: &S,
        client: &C,
        credential: &Credential,
        ids: &UniqueIds,
        reporter: &R,
    ) -> Result<StageStats, AppError>
    where
        S: DocumentStore,
        C: CatalogClient,
        R: ProgressReporter,
    {
        let mut records: Vec<Document> = store.load(&self.collection, Vec::new()).await?;

        let mut seen = seen_ids(&records);
        if seen.unkeyed > 0 {
            tracing::warn!(
                stage = %self.kind,
                count = seen.unkeyed,
                "Stored records without an id are ignored for dedup"
            );
        }

        let pending = ids.missing_from(&seen.ids);
        let mut stats = StageStats {
            already_stored: ids.len() - pending.len(),
            ..StageStats::new()
        };

        reporter.report(HarvestEvent::StageStarted {
            stage: self.kind,
            pending: pending.len(),
            already_stored: stats.already_stored,
        });

        let mut unflushed = 0usize;
        for id in pending {
            if !seen.ids.insert(id) {
                continue;
            }
            let outcome = match self.kind.fetch(client, credential, id).await {
                Ok(document) => {
                    records.push(stamp_id(document, id));
                    reporter.report(HarvestEvent::RecordFetched {
                        stage: self.kind,
                        id,
                    });
                    FetchOutcome::Fetched
                }
                Err(e) => {
                    reporter.report(HarvestEvent::RecordFailed {
                        stage: self.kind,
                        id,
                        error: &e,
                        policy: self.policy,
                    });
                    match self.policy {
                        FailurePolicy::Retry => FetchOutcome::Failed,
                        FailurePolicy::Placeholder => {
                            records.push(placeholder(id));
                            FetchOutcome::Placeholder
                        }
                    }
                }
            };
            stats.record(outcome);

            if outcome != FetchOutcome::Failed {
                unflushed += 1;
            }
            if self.flush_every.is_some_and(|every| unflushed >= every) {
                store.save(&self.collection, &records).await?;
                reporter.report(HarvestEvent::StageFlushed {
                    stage: self.kind,
                    records: records.len(),
                });
                unflushed = 0;
            }
        }

        store.save(&self.collection, &records).await?;
        reporter.report(HarvestEvent::StageCompleted {
            stage: self.kind,
            stats: &stats,
        });

        Ok(stats)
    }
}
