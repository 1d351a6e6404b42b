//! Trait definitions for external dependencies.
//!
//! This module defines traits that abstract over the collaborators the
//! harvester does not own (catalog API, document storage, credential
//! provisioning), enabling:
//!
//! - **Testability**: in-memory mocks for the stages and the orchestrator
//! - **Flexibility**: a different API or storage backend without touching the stages
//! - **Decoupling**: core logic doesn't depend on reqwest or the filesystem
//!
//! # Example
//!
//! ```
//! use marquee_core::traits::{CatalogClient, DocumentStore};
//! use marquee_core::{AppError, Credential};
//!
//! // Business logic uses traits, not concrete types
//! async fn first_page_ids<C, S>(
//!     client: &C,
//!     store: &S,
//!     credential: &Credential,
//! ) -> Result<usize, AppError>
//! where
//!     C: CatalogClient,
//!     S: DocumentStore,
//! {
//!     let ids = client.list_page(credential, 1).await?;
//!     store.save("first_page.json", &ids).await?;
//!     Ok(ids.len())
//! }
//! ```

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{Document, EntityId};
use crate::{AppError, Credential};

/// Client for the remote movie catalog.
///
/// Every operation returns a tagged result: the caller decides what a
/// failure means for its stage. Implementations must not retry.
pub trait CatalogClient: Send + Sync + Clone {
    /// Lists the candidate ids on one page of the discovery listing.
    ///
    /// # Arguments
    ///
    /// * `credential` - Bearer token for the request
    /// * `page` - 1-based page number
    fn list_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> impl Future<Output = Result<Vec<EntityId>, AppError>> + Send;

    /// Fetches the detail document of one entity.
    fn get_detail(
        &self,
        credential: &Credential,
        id: EntityId,
    ) -> impl Future<Output = Result<Document, AppError>> + Send;

    /// Fetches the related set (credits) of one entity.
    ///
    /// The returned document's `id` equals the entity id it describes.
    fn get_related_set(
        &self,
        credential: &Credential,
        id: EntityId,
    ) -> impl Future<Output = Result<Document, AppError>> + Send;
}

/// Key-value store of whole JSON collections.
///
/// Single-writer by contract: the job assumes one process instance at a time
/// and no locking is performed.
pub trait DocumentStore: Send + Sync + Clone {
    /// Loads a collection, or returns `default` unchanged if it doesn't exist.
    ///
    /// # Errors
    ///
    /// A collection that exists but cannot be decoded is an
    /// `AppError::CorruptDocument`; no recovery is attempted.
    fn load<T>(&self, name: &str, default: T) -> impl Future<Output = Result<T, AppError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Replaces a collection with `document`. Never a partial or append write.
    fn save<T>(&self, name: &str, document: &T) -> impl Future<Output = Result<(), AppError>> + Send
    where
        T: Serialize + Sync;

    /// Returns true if the collection has been saved before.
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// Provides the API credential at the start of every cycle.
pub trait TokenSource: Send + Sync {
    /// Returns the credential, or `AppError::MissingCredential`.
    fn credential(&self) -> Result<Credential, AppError>;
}
