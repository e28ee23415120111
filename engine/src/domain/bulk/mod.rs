//! Bulk operations
//!
//! Applies one update payload (or a deletion) to every record matching a
//! filter, or to a single record by id:
//! validate -> match -> confirm -> execute -> summarize.

mod orchestrator;
mod summary;

use crate::data::types::{Operation, Record};
use crate::domain::query::FilterGroup;

pub use crate::data::types::BulkState;
pub use orchestrator::BulkOrchestrator;
pub use summary::BulkSummary;

/// Which records a bulk request applies to
#[derive(Debug, Clone, PartialEq)]
pub enum BulkTarget {
    /// A single record by primary id; no retrieval is done
    Record(String),
    /// Every record matching the filter groups
    Filter(Vec<FilterGroup>),
}

/// What to do with each matched record
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    Update(Record),
    Delete,
}

impl BulkAction {
    /// Verb for messages ("update", "delete")
    pub fn verb(&self) -> &'static str {
        match self {
            BulkAction::Update(_) => "update",
            BulkAction::Delete => "delete",
        }
    }

    pub(crate) fn operation(&self, collection: &str, id: &str) -> Operation {
        match self {
            BulkAction::Update(payload) => Operation::update(collection, id, payload.clone()),
            BulkAction::Delete => Operation::delete(collection, id),
        }
    }
}

/// One bulk run as requested by the user
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    /// Table name as typed by the user
    pub entity: String,
    pub target: BulkTarget,
    pub action: BulkAction,
}

impl BulkRequest {
    pub fn update_matching(
        entity: impl Into<String>,
        groups: Vec<FilterGroup>,
        payload: Record,
    ) -> Self {
        Self {
            entity: entity.into(),
            target: BulkTarget::Filter(groups),
            action: BulkAction::Update(payload),
        }
    }

    pub fn delete_matching(entity: impl Into<String>, groups: Vec<FilterGroup>) -> Self {
        Self {
            entity: entity.into(),
            target: BulkTarget::Filter(groups),
            action: BulkAction::Delete,
        }
    }

    pub fn update_record(entity: impl Into<String>, id: impl Into<String>, payload: Record) -> Self {
        Self {
            entity: entity.into(),
            target: BulkTarget::Record(id.into()),
            action: BulkAction::Update(payload),
        }
    }

    pub fn delete_record(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            target: BulkTarget::Record(id.into()),
            action: BulkAction::Delete,
        }
    }
}

/// How a bulk run ended
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    /// Filter matched nothing; nothing was confirmed or written
    NoMatches,
    /// User declined the confirmation; nothing was written
    Cancelled,
    Completed(BulkSummary),
}
