//! Batch execution
//!
//! Runs a list of write operations against `DataAccess` with a bound on
//! in-flight calls and an optional start rate. Every operation gets its own
//! outcome; a failure never stops the rest of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

use crate::core::config::BatchConfig;
use crate::core::constants::{
    DEFAULT_BATCH_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL, MAX_BATCH_RATE,
};
use crate::data::error::EngineError;
use crate::data::traits::{DataAccess, ProgressSink};
use crate::data::types::{BatchResult, Operation, OperationMethod};

/// Concurrency and rate bound for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimit {
    pub max_in_flight: usize,
    pub max_per_second: Option<u32>,
}

impl Default for BatchLimit {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_BATCH_CONCURRENCY,
            max_per_second: None,
        }
    }
}

impl BatchLimit {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight,
            max_per_second: None,
        }
    }

    pub fn per_second(mut self, rate: u32) -> Self {
        self.max_per_second = Some(rate);
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.max_in_flight == 0 {
            return Err(EngineError::Config(
                "batch max_in_flight must be greater than 0".into(),
            ));
        }
        if self.max_per_second == Some(0) {
            return Err(EngineError::Config(
                "batch max_per_second must be greater than 0".into(),
            ));
        }
        if let Some(rate) = self.max_per_second
            && rate > MAX_BATCH_RATE
        {
            return Err(EngineError::Config(format!(
                "batch max_per_second must be at most {}, got {}",
                MAX_BATCH_RATE, rate
            )));
        }
        Ok(())
    }

    fn pacer(&self) -> Option<Mutex<Interval>> {
        self.max_per_second.map(|rate| {
            // tokio::time::interval panics on a zero period
            let period = (Duration::from_secs(1) / rate).max(Duration::from_nanos(1));
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Mutex::new(interval)
        })
    }
}

impl From<&BatchConfig> for BatchLimit {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_in_flight: config.concurrency,
            max_per_second: config.max_per_second,
        }
    }
}

/// Executes write operations with bounded concurrency
pub struct BatchExecutor {
    data: Arc<dyn DataAccess>,
    progress_interval: usize,
}

impl BatchExecutor {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self {
            data,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Report progress every `interval` completions
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Run every operation to completion
    ///
    /// Progress fires every `progress_interval` completions and once more
    /// at the end with `processed == total`. Errors are recorded by index;
    /// only an invalid `limit` fails the call itself.
    pub async fn run(
        &self,
        operations: &[Operation],
        limit: &BatchLimit,
        on_progress: &dyn ProgressSink,
    ) -> Result<BatchResult, EngineError> {
        limit.validate()?;

        let total = operations.len();
        let started = Instant::now();
        let pacer = limit.pacer();
        let pacer = pacer.as_ref();

        tracing::debug!(
            total,
            max_in_flight = limit.max_in_flight,
            max_per_second = ?limit.max_per_second,
            "Batch started"
        );

        let mut outcomes = futures::stream::iter(operations.iter().enumerate().map(
            |(index, operation)| async move {
                if let Some(pacer) = pacer {
                    pacer.lock().await.tick().await;
                }
                (index, self.execute(operation).await)
            },
        ))
        .buffer_unordered(limit.max_in_flight);

        let mut result = BatchResult::default();
        let mut failures: Vec<(usize, String)> = Vec::new();
        let mut processed = 0usize;

        while let Some((index, outcome)) = outcomes.next().await {
            processed += 1;
            match outcome {
                Ok(()) => result.record_success(),
                Err(error) => {
                    tracing::debug!(index, error = %error, "Batch operation failed");
                    failures.push((index, error));
                }
            }
            if processed % self.progress_interval == 0 && processed < total {
                on_progress.report(processed, total);
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        for (index, error) in failures {
            result.record_failure(index, error);
        }
        on_progress.report(total, total);

        tracing::info!(
            total,
            succeeded = result.success_count,
            failed = result.fail_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );
        Ok(result)
    }

    async fn execute(&self, operation: &Operation) -> Result<(), String> {
        let collection = operation.collection.as_str();
        match &operation.method {
            OperationMethod::Create => {
                let payload = operation
                    .payload
                    .as_ref()
                    .ok_or("CREATE requires a payload")?;
                self.data
                    .create(collection, payload)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
            OperationMethod::Update => {
                let id = record_id(operation).ok_or("UPDATE requires a record id")?;
                let payload = operation
                    .payload
                    .as_ref()
                    .ok_or("UPDATE requires a payload")?;
                self.data
                    .update(collection, id, payload)
                    .await
                    .map_err(|e| e.to_string())
            }
            OperationMethod::Delete => {
                let id = record_id(operation).ok_or("DELETE requires a record id")?;
                self.data
                    .delete(collection, id)
                    .await
                    .map_err(|e| e.to_string())
            }
            OperationMethod::Unknown(raw) => Err(format!("Unknown method: {}", raw)),
        }
    }
}

fn record_id(operation: &Operation) -> Option<&str> {
    operation
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
