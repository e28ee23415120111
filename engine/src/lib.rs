//! QueryDeck engine
//!
//! Request-building core for querying and bulk-mutating records in an
//! OData-flavoured entity service:
//! - `domain::query` - filter compiler and query options builder
//! - `domain::paging` - continuation-token pagination
//! - `domain::batch` - bounded-concurrency write execution
//! - `domain::bulk` - validate/match/confirm/execute/summarize workflow
//! - `data` - collaborator traits, shared types and error types
//! - `core` - configuration, constants and logging

pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use data::{
    AttributeMap, BatchResult, BulkState, ConfirmationPrompt, Cursor, DataAccess, DataError, EngineError,
    EntityContext, EntityContextResolver, Operation, OperationMethod, ProgressSink, Record,
    RecordPage, ValueType,
};
pub use domain::batch::{BatchExecutor, BatchLimit};
pub use domain::bulk::{BulkAction, BulkOrchestrator, BulkOutcome, BulkRequest, BulkTarget};
pub use domain::paging::{LoadOutcome, Paginator};
pub use domain::query::{
    FilterCondition, FilterGroup, FilterType, GroupOperator, OrderBy, QueryOptions, SortDirection,
    compile,
};
