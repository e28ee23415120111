//! Shared data types
//!
//! Records, pages, write operations and batch results exchanged between
//! the engine and its collaborators.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single entity record as returned by the service
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Continuation token; `None` means no further page exists
pub type Cursor = Option<String>;

/// Attribute logical name -> value type, from entity metadata
pub type AttributeMap = HashMap<String, ValueType>;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Value type of a filterable attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    Datetime,
    Guid,
    Lookup,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Datetime => "datetime",
            ValueType::Guid => "guid",
            ValueType::Lookup => "lookup",
        };
        f.write_str(name)
    }
}

// ============================================================================
// PAGES
// ============================================================================

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub cursor: Cursor,
}

impl RecordPage {
    pub fn new(records: Vec<Record>, cursor: Cursor) -> Self {
        Self { records, cursor }
    }

    /// Final page (no continuation)
    pub fn last(records: Vec<Record>) -> Self {
        Self::new(records, None)
    }
}

// ============================================================================
// ENTITY CONTEXT
// ============================================================================

/// Resolved target of a user-typed table name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityContext {
    /// Entity set name used in request paths (e.g. `accounts`)
    pub collection: String,
    /// Logical name (e.g. `account`)
    pub canonical_name: String,
    /// Primary key attribute (e.g. `accountid`)
    pub primary_id_attribute: String,
}

impl EntityContext {
    /// Context with the conventional `<logicalname>id` primary key
    pub fn new(collection: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        let canonical_name = canonical_name.into();
        Self {
            collection: collection.into(),
            primary_id_attribute: format!("{}id", canonical_name),
            canonical_name,
        }
    }

    pub fn with_primary_id(mut self, attribute: impl Into<String>) -> Self {
        self.primary_id_attribute = attribute.into();
        self
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Write method of a batch operation
///
/// Parsed from text; anything unrecognized is kept verbatim so the batch
/// engine can report it per item instead of rejecting the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationMethod {
    Create,
    Update,
    Delete,
    Unknown(String),
}

impl FromStr for OperationMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Self::Create,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Unknown(s.to_string()),
        })
    }
}

impl From<String> for OperationMethod {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl From<OperationMethod> for String {
    fn from(method: OperationMethod) -> Self {
        method.to_string()
    }
}

impl fmt::Display for OperationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMethod::Create => f.write_str("CREATE"),
            OperationMethod::Update => f.write_str("UPDATE"),
            OperationMethod::Delete => f.write_str("DELETE"),
            OperationMethod::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One write against the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub method: OperationMethod,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Record>,
}

impl Operation {
    pub fn create(collection: impl Into<String>, payload: Record) -> Self {
        Self {
            method: OperationMethod::Create,
            collection: collection.into(),
            id: None,
            payload: Some(payload),
        }
    }

    pub fn update(collection: impl Into<String>, id: impl Into<String>, payload: Record) -> Self {
        Self {
            method: OperationMethod::Update,
            collection: collection.into(),
            id: Some(id.into()),
            payload: Some(payload),
        }
    }

    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            method: OperationMethod::Delete,
            collection: collection.into(),
            id: Some(id.into()),
            payload: None,
        }
    }
}

// ============================================================================
// BATCH RESULT
// ============================================================================

/// Failure of one operation inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Position of the operation in the submitted list
    pub index: usize,
    /// Human-readable reason
    pub error: String,
}

/// Aggregate outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// Ordered by index
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, index: usize, error: impl Into<String>) {
        self.fail_count += 1;
        self.errors.push(BatchError {
            index,
            error: error.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.fail_count > 0
    }
}

// ============================================================================
// BULK STATE
// ============================================================================

/// Bulk workflow state, published on every transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BulkState {
    #[default]
    Idle,
    Validating,
    Matching,
    Confirming,
    Executing,
    Summarized,
}

impl fmt::Display for BulkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BulkState::Idle => "idle",
            BulkState::Validating => "validating",
            BulkState::Matching => "matching",
            BulkState::Confirming => "confirming",
            BulkState::Executing => "executing",
            BulkState::Summarized => "summarized",
        };
        f.write_str(name)
    }
}
