//! Single-flight de-duplication for metadata fetches
//!
//! Wraps any `EntityContextResolver` so that concurrent `attribute_map`
//! requests for the same entity share one underlying call. Nothing is
//! retained once the call completes; a later request fetches again.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::error::DataError;
use super::traits::EntityContextResolver;
use super::types::{AttributeMap, EntityContext};

/// Keyed single-flight group
///
/// At most one `fetch` per key is in flight; callers arriving while it runs
/// await the same result.
pub struct SingleFlight<V> {
    in_flight: DashMap<String, Arc<OnceCell<V>>>,
}

impl<V> Default for SingleFlight<V> {
    fn default() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }
}

impl<V: Clone> SingleFlight<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` for `key`, or join the call already running for it
    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let entry = self.in_flight.entry(key.to_string()).or_default();
            Arc::clone(entry.value())
        };

        if cell.initialized() {
            tracing::trace!(key, "Joining completed single-flight call");
        } else if Arc::strong_count(&cell) > 2 {
            tracing::debug!(key, "Joining in-flight call");
        }

        let value = cell.get_or_init(fetch).await.clone();

        // Only the entry we joined is removed; a newer flight for the same
        // key must stay visible to its own callers.
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, &cell));
        value
    }

    /// Number of keys with a call currently registered
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Resolver wrapper that de-duplicates concurrent attribute-map fetches
pub struct SingleFlightResolver {
    inner: Arc<dyn EntityContextResolver>,
    attribute_maps: SingleFlight<Result<AttributeMap, DataError>>,
}

impl SingleFlightResolver {
    pub fn new(inner: Arc<dyn EntityContextResolver>) -> Self {
        Self {
            inner,
            attribute_maps: SingleFlight::new(),
        }
    }
}

#[async_trait]
impl EntityContextResolver for SingleFlightResolver {
    async fn resolve(&self, user_typed_name: &str) -> Result<EntityContext, DataError> {
        self.inner.resolve(user_typed_name).await
    }

    async fn attribute_map(&self, canonical_name: &str) -> Result<AttributeMap, DataError> {
        let key = canonical_name.to_ascii_lowercase();
        self.attribute_maps
            .run(&key, || self.inner.attribute_map(canonical_name))
            .await
    }
}
