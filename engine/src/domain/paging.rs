//! Continuation-token pagination
//!
//! `Paginator` owns the cursor and the accumulated record set for one query.
//! A single latch guards every fetch: while one load runs, overlapping calls
//! return `LoadOutcome::Skipped` instead of queueing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::data::error::EngineError;
use crate::data::traits::{DataAccess, ProgressSink};
use crate::data::types::{Cursor, Record, RecordPage};

/// Result of a load call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing to fetch, or another load was already running
    Skipped,
    /// `pages` were fetched, appending `records` records
    Loaded { pages: usize, records: usize },
}

#[derive(Debug, Default)]
struct PageState {
    collection: String,
    cursor: Cursor,
    records: Vec<Record>,
}

/// Clears the loading latch when dropped, including on cancellation
struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Cursor and accumulated records for one query
pub struct Paginator {
    data: Arc<dyn DataAccess>,
    state: Mutex<PageState>,
    loading: AtomicBool,
}

impl Paginator {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self {
            data,
            state: Mutex::new(PageState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Start a new query: clear all state and fetch its first page
    ///
    /// If the first fetch fails the paginator stays empty. A start issued
    /// while another load runs is dropped, not queued: it returns
    /// `LoadOutcome::Skipped` and the previous query's records stay in place,
    /// so callers must check the outcome and start again once `is_loading`
    /// clears.
    pub async fn start(&self, collection: &str, query: &str) -> Result<LoadOutcome, EngineError> {
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::info!(collection, query, "Load already in progress, new query dropped");
            return Ok(LoadOutcome::Skipped);
        };

        *self.state.lock() = PageState {
            collection: collection.to_string(),
            ..PageState::default()
        };

        let page = self.fetch(collection, query).await?;
        let records = self.append(page);
        Ok(LoadOutcome::Loaded { pages: 1, records })
    }

    /// Fetch the next page if one exists and no load is running
    pub async fn load_next(&self) -> Result<LoadOutcome, EngineError> {
        let Some((collection, cursor)) = self.continuation() else {
            return Ok(LoadOutcome::Skipped);
        };
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::debug!(collection, "Load already in progress, next page skipped");
            return Ok(LoadOutcome::Skipped);
        };

        let page = self.fetch(&collection, &cursor).await?;
        let records = self.append(page);
        Ok(LoadOutcome::Loaded { pages: 1, records })
    }

    /// Follow the cursor until the source reports no further page
    ///
    /// Progress is reported after every page as `(accumulated, accumulated)`
    /// since the total is not known upfront.
    pub async fn load_all(&self, progress: &dyn ProgressSink) -> Result<LoadOutcome, EngineError> {
        if self.continuation().is_none() {
            return Ok(LoadOutcome::Skipped);
        }
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::debug!("Load already in progress, load all skipped");
            return Ok(LoadOutcome::Skipped);
        };

        let mut pages = 0;
        let mut records = 0;
        while let Some((collection, cursor)) = self.continuation() {
            let page = self.fetch(&collection, &cursor).await?;
            pages += 1;
            records += self.append(page);

            let accumulated = self.record_count();
            progress.report(accumulated, accumulated);
        }

        tracing::debug!(pages, records, total = self.record_count(), "Loaded all pages");
        Ok(LoadOutcome::Loaded { pages, records })
    }

    /// Snapshot of the accumulated records
    pub fn records(&self) -> Vec<Record> {
        self.state.lock().records.clone()
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.state.lock().cursor.clone()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().cursor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    fn continuation(&self) -> Option<(String, String)> {
        let state = self.state.lock();
        state
            .cursor
            .clone()
            .map(|cursor| (state.collection.clone(), cursor))
    }

    async fn fetch(&self, collection: &str, query: &str) -> Result<RecordPage, EngineError> {
        self.data
            .retrieve_page(collection, query)
            .await
            .map_err(|e| {
                tracing::warn!(collection, error = %e, "Page fetch failed");
                EngineError::retryable(&e)
            })
    }

    fn append(&self, page: RecordPage) -> usize {
        let mut state = self.state.lock();
        let added = page.records.len();
        state.records.extend(page.records);
        state.cursor = page.cursor;
        tracing::debug!(
            added,
            total = state.records.len(),
            has_more = state.cursor.is_some(),
            "Page appended"
        );
        added
    }
}
