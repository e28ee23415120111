//! Collaborator traits
//!
//! The engine owns no transport, metadata cache or UI. These traits are the
//! seams where the host application plugs those in.

use async_trait::async_trait;

use super::error::DataError;
use super::types::{AttributeMap, EntityContext, Record, RecordPage};

/// Record access against the remote entity service
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Fetch one page.
    ///
    /// `query` is either a full query-options string or a cursor returned
    /// by a previous page, passed back verbatim.
    async fn retrieve_page(&self, collection: &str, query: &str) -> Result<RecordPage, DataError>;

    /// Create a record, returning its id
    async fn create(&self, collection: &str, payload: &Record) -> Result<String, DataError>;

    async fn update(&self, collection: &str, id: &str, payload: &Record) -> Result<(), DataError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DataError>;
}

/// Maps user-typed table names to collections and attribute metadata
#[async_trait]
pub trait EntityContextResolver: Send + Sync {
    async fn resolve(&self, user_typed_name: &str) -> Result<EntityContext, DataError>;

    async fn attribute_map(&self, canonical_name: &str) -> Result<AttributeMap, DataError>;
}

/// Yes/no confirmation before destructive work
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn ask(&self, title: &str, message: &str) -> bool;
}

/// Receives `(processed, total)` updates for display
pub trait ProgressSink: Send + Sync {
    fn report(&self, processed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}
