//! Engine event bus
//!
//! Replaces ambient refresh listeners with an explicit, injectable bus:
//! - `EventBus::subscribe` binds a synchronous handler and returns a
//!   `Subscription` handle; dropping or disposing the handle unbinds it.
//! - `Subscriptions` collects handles so a view can release all of its
//!   bindings in one scoped teardown.
//! - `EventBus::listen` hands out a broadcast receiver for async consumers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::core::constants::DEFAULT_EVENT_CHANNEL_CAPACITY;

use super::types::BulkState;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
            NoticeLevel::Success => write!(f, "success"),
        }
    }
}

/// Message for the host's toast/notification surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Events published by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Bulk workflow entered a new state
    BulkStateChanged(BulkState),
    /// Records in a collection were written; views showing it should refresh
    RecordsChanged { collection: String, affected: usize },
    /// Something worth telling the user
    Notice(Notice),
}

type Handler = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

struct Registry {
    handlers: RwLock<BTreeMap<u64, Handler>>,
    next_id: AtomicU64,
}

/// Publish/subscribe hub for `EngineEvent`s
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Registry>,
    sender: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            registry: Arc::new(Registry {
                handlers: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
            sender,
        }
    }

    /// Bind a handler; it stays bound until the returned handle is released
    #[must_use = "dropping the subscription unbinds the handler immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.handlers.write().insert(id, Arc::new(handler));
        tracing::trace!(id, "Event handler bound");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Receiver for async consumers; lagging receivers miss old events
    pub fn listen(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to every bound handler and listener
    pub fn publish(&self, event: EngineEvent) {
        // Snapshot so handlers may bind/unbind without deadlocking.
        let handlers: Vec<Handler> = self.registry.handlers.read().values().cloned().collect();
        for handler in &handlers {
            handler(&event);
        }
        // No listeners is not an error
        let _ = self.sender.send(event);
    }

    /// Number of bound handlers
    pub fn handler_count(&self) -> usize {
        self.registry.handlers.read().len()
    }
}

/// Handle for one bound handler
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Unbind now (same as dropping)
    pub fn dispose(self) {}

    fn unbind(&self) {
        if let Some(registry) = self.registry.upgrade()
            && registry.handlers.write().remove(&self.id).is_some()
        {
            tracing::trace!(id = self.id, "Event handler unbound");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Arena of subscriptions released together
#[derive(Debug, Default)]
pub struct Subscriptions {
    items: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.items.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Release every held subscription (newest first)
    pub fn dispose(&mut self) {
        while let Some(subscription) = self.items.pop() {
            subscription.dispose();
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Extend<Subscription> for Subscriptions {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
