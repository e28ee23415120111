//! Scripted collaborators for unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::data::error::DataError;
use crate::data::traits::{ConfirmationPrompt, DataAccess, EntityContextResolver};
use crate::data::types::{AttributeMap, EntityContext, Record, RecordPage, ValueType};

/// Build a record from a JSON object literal
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record fixture must be an object, got {other}"),
    }
}

/// Records with only an id attribute
pub fn id_records(attribute: &str, ids: &[&str]) -> Vec<Record> {
    ids.iter()
        .map(|id| {
            let mut record = Record::new();
            record.insert(attribute.to_string(), Value::String(id.to_string()));
            record
        })
        .collect()
}

// ============================================================================
// DATA ACCESS
// ============================================================================

/// `DataAccess` answering from queued pages and failing on chosen ids
#[derive(Default)]
pub struct ScriptedDataAccess {
    pages: Mutex<HashMap<String, VecDeque<Result<RecordPage, DataError>>>>,
    failing_ids: HashMap<String, DataError>,
    failing_names: HashSet<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
    written: Mutex<Vec<(String, String)>>,
    retrieve_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedDataAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page answered for `query` (or cursor)
    pub fn with_page(self, query: &str, page: RecordPage) -> Self {
        self.queue(query, Ok(page));
        self
    }

    /// Queue a failure answered for `query` (or cursor)
    pub fn with_page_error(self, query: &str, error: DataError) -> Self {
        self.queue(query, Err(error));
        self
    }

    /// Queue another answer after construction
    pub fn queue(&self, query: &str, answer: Result<RecordPage, DataError>) {
        self.pages
            .lock()
            .entry(query.to_string())
            .or_default()
            .push_back(answer);
    }

    /// Updates and deletes against `id` fail with `error`
    pub fn failing_id(mut self, id: &str, error: DataError) -> Self {
        self.failing_ids.insert(id.to_string(), error);
        self
    }

    /// Creates whose payload `name` equals `name` fail
    pub fn failing_create(mut self, name: &str) -> Self {
        self.failing_names.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Highest number of writes observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Queries passed to `retrieve_page`, in call order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// `(method, id)` of every successful write, in completion order
    pub fn written(&self) -> Vec<(String, String)> {
        self.written.lock().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn write(&self, method: &str, id: &str) -> Result<(), DataError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.pause().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failing_ids.get(id) {
            return Err(error.clone());
        }
        self.written.lock().push((method.to_string(), id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl DataAccess for ScriptedDataAccess {
    async fn retrieve_page(&self, _collection: &str, query: &str) -> Result<RecordPage, DataError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.to_string());
        self.pause().await;

        let answer = self
            .pages
            .lock()
            .get_mut(query)
            .and_then(VecDeque::pop_front);
        answer.unwrap_or_else(|| Err(DataError::NotFound(format!("no page for {query}"))))
    }

    async fn create(&self, _collection: &str, payload: &Record) -> Result<String, DataError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
        let name = payload.get("name").and_then(Value::as_str).unwrap_or_default();
        if self.failing_names.contains(name) {
            self.pause().await;
            return Err(DataError::http(400, format!("cannot create {name}")));
        }
        let id = format!("new-{n}");
        self.write("CREATE", &id).await?;
        Ok(id)
    }

    async fn update(&self, _collection: &str, id: &str, _payload: &Record) -> Result<(), DataError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.write("UPDATE", id).await
    }

    async fn delete(&self, _collection: &str, id: &str) -> Result<(), DataError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.write("DELETE", id).await
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolver over a fixed set of entities
#[derive(Default)]
pub struct StaticResolver {
    entities: HashMap<String, EntityContext>,
    attributes: HashMap<String, AttributeMap>,
    attribute_error: Option<DataError>,
    delay: Option<Duration>,
    attribute_map_calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: &str, context: EntityContext) -> Self {
        self.attributes
            .entry(context.canonical_name.to_ascii_lowercase())
            .or_default();
        self.entities.insert(name.to_ascii_lowercase(), context);
        self
    }

    pub fn with_attribute(mut self, entity: &str, attribute: &str, value_type: ValueType) -> Self {
        self.attributes
            .entry(entity.to_ascii_lowercase())
            .or_default()
            .insert(attribute.to_string(), value_type);
        self
    }

    /// Every attribute-map fetch fails with `error`
    pub fn with_attribute_error(mut self, error: DataError) -> Self {
        self.attribute_error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attribute_map_calls(&self) -> usize {
        self.attribute_map_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityContextResolver for StaticResolver {
    async fn resolve(&self, user_typed_name: &str) -> Result<EntityContext, DataError> {
        self.entities
            .get(&user_typed_name.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("entity {user_typed_name}")))
    }

    async fn attribute_map(&self, canonical_name: &str) -> Result<AttributeMap, DataError> {
        self.attribute_map_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.attribute_error {
            return Err(error.clone());
        }
        self.attributes
            .get(&canonical_name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("metadata for {canonical_name}")))
    }
}

// ============================================================================
// PROMPT
// ============================================================================

/// Prompt with a fixed answer that records what it was asked
pub struct FixedPrompt {
    answer: bool,
    asked: Mutex<Vec<(String, String)>>,
}

impl FixedPrompt {
    pub fn accept() -> Self {
        Self {
            answer: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn decline() -> Self {
        Self {
            answer: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// `(title, message)` pairs in call order
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl ConfirmationPrompt for FixedPrompt {
    async fn ask(&self, title: &str, message: &str) -> bool {
        self.asked
            .lock()
            .push((title.to_string(), message.to_string()));
        self.answer
    }
}
