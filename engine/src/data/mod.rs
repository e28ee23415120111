//! Data layer
//!
//! Collaborator seams and the types that cross them:
//! - `traits` - `DataAccess`, `EntityContextResolver`, `ConfirmationPrompt`, `ProgressSink`
//! - `types` - records, pages, operations, batch results
//! - `error` - `DataError` (collaborators) and `EngineError` (engine taxonomy)
//! - `dedup` - single-flight wrapper for metadata fetches
//! - `events` - injectable event bus with disposable subscriptions

pub mod dedup;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use dedup::{SingleFlight, SingleFlightResolver};
pub use error::{DataError, EngineError};
pub use events::{EngineEvent, EventBus, Notice, NoticeLevel, Subscription, Subscriptions};
pub use traits::{ConfirmationPrompt, DataAccess, EntityContextResolver, ProgressSink};
pub use types::{
    AttributeMap, BatchError, BatchResult, BulkState, Cursor, EntityContext, Operation, OperationMethod,
    Record, RecordPage, ValueType,
};
