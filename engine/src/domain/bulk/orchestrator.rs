//! Bulk workflow driver

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::core::config::BatchConfig;
use crate::core::constants::{BULK_CANCELLED, BULK_CONFIRM_TITLE, NO_RECORDS_MATCH};
use crate::data::dedup::SingleFlightResolver;
use crate::data::error::EngineError;
use crate::data::events::{EngineEvent, EventBus, Notice, NoticeLevel};
use crate::data::traits::{ConfirmationPrompt, DataAccess, EntityContextResolver, ProgressSink};
use crate::data::types::{AttributeMap, EntityContext, Operation};
use crate::domain::batch::{BatchExecutor, BatchLimit};
use crate::domain::paging::Paginator;
use crate::domain::query::{
    FilterGroup, QueryOptions, compile, resolver_for, unapplied_conditions,
};

use super::{BulkOutcome, BulkRequest, BulkState, BulkSummary, BulkTarget};

/// Runs bulk requests end to end
pub struct BulkOrchestrator {
    data: Arc<dyn DataAccess>,
    resolver: SingleFlightResolver,
    prompt: Arc<dyn ConfirmationPrompt>,
    events: EventBus,
    executor: BatchExecutor,
    limit: BatchLimit,
    state: Mutex<BulkState>,
}

impl BulkOrchestrator {
    pub fn new(
        data: Arc<dyn DataAccess>,
        resolver: Arc<dyn EntityContextResolver>,
        prompt: Arc<dyn ConfirmationPrompt>,
        events: EventBus,
    ) -> Self {
        Self {
            executor: BatchExecutor::new(data.clone()),
            data,
            resolver: SingleFlightResolver::new(resolver),
            prompt,
            events,
            limit: BatchLimit::default(),
            state: Mutex::new(BulkState::Idle),
        }
    }

    /// Apply batch limits and progress cadence from configuration
    pub fn with_config(mut self, config: &BatchConfig) -> Self {
        self.limit = BatchLimit::from(config);
        self.executor = BatchExecutor::new(self.data.clone())
            .with_progress_interval(config.progress_interval);
        self
    }

    pub fn state(&self) -> BulkState {
        *self.state.lock()
    }

    /// Validate, match, confirm, execute and summarize one request
    ///
    /// Validation and resolution failures abort before anything is read or
    /// written. The state returns to `Idle` unless the run completes.
    pub async fn run(
        &self,
        request: &BulkRequest,
        progress: &dyn ProgressSink,
    ) -> Result<BulkOutcome, EngineError> {
        let outcome = self.drive(request, progress).await;

        match &outcome {
            Ok(BulkOutcome::Completed(_)) => {}
            Ok(_) => self.transition(BulkState::Idle),
            Err(e) => {
                tracing::warn!(entity = %request.entity, error = %e, "Bulk operation failed");
                self.notify(NoticeLevel::Error, e.user_message());
                self.transition(BulkState::Idle);
            }
        }
        outcome
    }

    async fn drive(
        &self,
        request: &BulkRequest,
        progress: &dyn ProgressSink,
    ) -> Result<BulkOutcome, EngineError> {
        self.transition(BulkState::Validating);
        let entity = validate(request)?;

        self.transition(BulkState::Matching);
        let context = self.resolver.resolve(entity).await.map_err(|e| {
            EngineError::Resolution(format!("Cannot resolve table '{}': {}", entity, e))
        })?;

        let ids = match &request.target {
            BulkTarget::Record(id) => vec![id.trim().to_string()],
            BulkTarget::Filter(groups) => self.match_ids(&context, groups).await?,
        };

        if ids.is_empty() {
            tracing::info!(entity, "Bulk filter matched no records");
            self.notify(NoticeLevel::Warning, NO_RECORDS_MATCH);
            return Ok(BulkOutcome::NoMatches);
        }

        self.transition(BulkState::Confirming);
        let verb = request.action.verb();
        let message = format!(
            "This will {} {} record(s) in {}. Continue?",
            verb,
            ids.len(),
            context.collection
        );
        if !self.prompt.ask(BULK_CONFIRM_TITLE, &message).await {
            tracing::info!(entity, matched = ids.len(), "Bulk operation declined");
            self.notify(NoticeLevel::Info, BULK_CANCELLED);
            return Ok(BulkOutcome::Cancelled);
        }

        self.transition(BulkState::Executing);
        let operations: Vec<Operation> = ids
            .iter()
            .map(|id| request.action.operation(&context.collection, id))
            .collect();
        let result = self.executor.run(&operations, &self.limit, progress).await?;

        let summary = BulkSummary::new(verb, result);
        if summary.succeeded > 0 {
            self.events.publish(EngineEvent::RecordsChanged {
                collection: context.collection.clone(),
                affected: summary.succeeded,
            });
        }
        self.events.publish(EngineEvent::Notice(summary.notice()));
        self.transition(BulkState::Summarized);

        tracing::info!(
            entity,
            action = verb,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk operation summarized"
        );
        Ok(BulkOutcome::Completed(summary))
    }

    /// Retrieve every matching record and collect its primary id
    async fn match_ids(
        &self,
        context: &EntityContext,
        groups: &[FilterGroup],
    ) -> Result<Vec<String>, EngineError> {
        let attribute_types = self.attribute_types(context).await;
        let resolver = resolver_for(attribute_types.as_ref());

        // A dropped condition widens the match, so refuse rather than write more
        let unapplied = unapplied_conditions(groups, resolver.as_ref());
        if !unapplied.is_empty() {
            let attributes = unapplied.join(", ");
            let reason = if attribute_types.is_some() {
                format!("Filter conditions on {} have invalid values", attributes)
            } else {
                format!(
                    "Filter conditions on {} cannot be applied until table metadata is available",
                    attributes
                )
            };
            return Err(EngineError::Validation(reason));
        }

        let query = QueryOptions::new()
            .select([context.primary_id_attribute.as_str()])
            .filter(groups.to_vec())
            .build_with(resolver.as_ref());
        tracing::debug!(collection = %context.collection, %query, "Matching records");

        let paginator = Paginator::new(self.data.clone());
        paginator.start(&context.collection, &query).await?;
        let report = |loaded: usize, _: usize| tracing::debug!(loaded, "Matching records loaded");
        paginator.load_all(&report).await?;

        let primary_id = context.primary_id_attribute.as_str();
        let mut ids = Vec::with_capacity(paginator.record_count());
        let mut skipped = 0usize;
        for record in paginator.records() {
            match record.get(primary_id) {
                Some(Value::String(id)) if !id.trim().is_empty() => ids.push(id.clone()),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(
                collection = %context.collection,
                primary_id,
                skipped,
                "Skipping matched records without an id"
            );
        }
        Ok(ids)
    }

    /// Attribute map, or `None` to fall back to metadata-free building
    async fn attribute_types(&self, context: &EntityContext) -> Option<AttributeMap> {
        match self.resolver.attribute_map(&context.canonical_name).await {
            Ok(types) => Some(types),
            Err(e) => {
                tracing::warn!(
                    entity = %context.canonical_name,
                    error = %e,
                    "Attribute metadata unavailable, building query without it"
                );
                None
            }
        }
    }

    fn transition(&self, next: BulkState) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Bulk state changed");
            self.events.publish(EngineEvent::BulkStateChanged(next));
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.events
            .publish(EngineEvent::Notice(Notice::new(level, message)));
    }
}

fn validate(request: &BulkRequest) -> Result<&str, EngineError> {
    let entity = request.entity.trim();
    if entity.is_empty() {
        return Err(EngineError::Validation("Table name is required".into()));
    }
    match &request.target {
        BulkTarget::Record(id) if id.trim().is_empty() => {
            Err(EngineError::Validation("Record id is required".into()))
        }
        BulkTarget::Filter(groups) if compile(groups).is_empty() => Err(EngineError::Validation(
            "At least one complete filter condition is required".into(),
        )),
        _ => Ok(entity),
    }
}
