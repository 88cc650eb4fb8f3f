use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// Event Handling - Bus, Listeners and Explicit Handler Registration
// ============================================================================
//
// Delivery is at-least-once and in publication order. Subscribers must
// tolerate redelivery and re-derive state idempotently. Handler registration
// is an explicit table keyed by event kind, validated when it is built; there
// is no runtime type introspection.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("a listener must subscribe to at least one event kind or to all events")]
    EmptyKindFilter,
}

#[derive(Debug, thiserror::Error)]
pub enum EventHandlingError {
    #[error("no handler registered for event kind `{0}`")]
    UnsupportedEvent(String),

    #[error("a handler for event kind `{0}` is already registered")]
    DuplicateHandler(String),

    #[error("an event handler must register at least one event kind")]
    NoEventKinds,
}

/// Receives published events. Errors are logged by the bus and never abort
/// delivery to other listeners.
#[async_trait]
pub trait EventListener<E: DomainEvent>: Send + Sync {
    async fn on_event(&self, event: &E) -> anyhow::Result<()>;
}

/// Publication side of the event bus.
#[async_trait]
pub trait EventBus<E: DomainEvent>: Send + Sync {
    /// Register a listener. `kinds` of `None` subscribes to every event;
    /// an explicit empty filter is a registration-time error.
    async fn subscribe(
        &self,
        listener: Arc<dyn EventListener<E>>,
        kinds: Option<&[&str]>,
    ) -> Result<(), SubscriptionError>;

    /// Remove a listener's registration for one event kind.
    async fn unsubscribe(&self, listener: &Arc<dyn EventListener<E>>, kind: &str);

    /// Deliver the event to every matching listener, in registration order.
    /// Returns `true` if at least one listener received it.
    async fn publish(&self, event: &E) -> bool;
}

/// In-process event bus with per-kind and catch-all subscriptions.
pub struct SimpleEventBus<E: DomainEvent> {
    by_kind: RwLock<HashMap<String, Vec<Arc<dyn EventListener<E>>>>>,
    catch_all: RwLock<Vec<Arc<dyn EventListener<E>>>>,
}

impl<E: DomainEvent> SimpleEventBus<E> {
    pub fn new() -> Self {
        Self {
            by_kind: RwLock::new(HashMap::new()),
            catch_all: RwLock::new(Vec::new()),
        }
    }
}

impl<E: DomainEvent> Default for SimpleEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent> EventBus<E> for SimpleEventBus<E> {
    async fn subscribe(
        &self,
        listener: Arc<dyn EventListener<E>>,
        kinds: Option<&[&str]>,
    ) -> Result<(), SubscriptionError> {
        match kinds {
            None => {
                self.catch_all.write().await.push(listener);
            }
            Some([]) => return Err(SubscriptionError::EmptyKindFilter),
            Some(kinds) => {
                let mut by_kind = self.by_kind.write().await;
                for kind in kinds {
                    by_kind
                        .entry((*kind).to_string())
                        .or_default()
                        .push(listener.clone());
                }
            }
        }
        Ok(())
    }

    async fn unsubscribe(&self, listener: &Arc<dyn EventListener<E>>, kind: &str) {
        let mut by_kind = self.by_kind.write().await;
        if let Some(listeners) = by_kind.get_mut(kind) {
            listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
        }
    }

    async fn publish(&self, event: &E) -> bool {
        let mut recipients: Vec<Arc<dyn EventListener<E>>> = Vec::new();

        {
            let by_kind = self.by_kind.read().await;
            if let Some(listeners) = by_kind.get(event.kind()) {
                recipients.extend(listeners.iter().cloned());
            }
        }
        {
            let catch_all = self.catch_all.read().await;
            for listener in catch_all.iter() {
                if !recipients.iter().any(|r| Arc::ptr_eq(r, listener)) {
                    recipients.push(listener.clone());
                }
            }
        }

        if recipients.is_empty() {
            tracing::debug!(event_kind = event.kind(), "No listeners for event");
            return false;
        }

        for listener in &recipients {
            if let Err(error) = listener.on_event(event).await {
                tracing::error!(
                    event_kind = event.kind(),
                    error = %error,
                    "Event listener failed; continuing delivery"
                );
            }
        }

        true
    }
}

/// Handler callback for one or more event kinds within a family.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    async fn handle(&self, event: &E) -> anyhow::Result<()>;
}

/// Listener backed by an explicit kind → handler table.
///
/// This replaces annotation-driven handler discovery: every handler is
/// registered under the exact event kinds it serves, and the table is
/// validated while it is built. Dispatching an event whose kind has no entry
/// fails with [`EventHandlingError::UnsupportedEvent`].
pub struct RoutingEventListener<E: DomainEvent> {
    handlers: HashMap<String, Arc<dyn EventHandler<E>>>,
}

impl<E: DomainEvent> RoutingEventListener<E> {
    pub fn builder() -> RoutingEventListenerBuilder<E> {
        RoutingEventListenerBuilder {
            handlers: HashMap::new(),
        }
    }

    pub fn registered_kinds(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

pub struct RoutingEventListenerBuilder<E: DomainEvent> {
    handlers: HashMap<String, Arc<dyn EventHandler<E>>>,
}

impl<E: DomainEvent> RoutingEventListenerBuilder<E> {
    /// Register a handler for the given event kinds. Fails eagerly if the
    /// kind list is empty or a kind already has a handler.
    pub fn register(
        mut self,
        kinds: &[&str],
        handler: Arc<dyn EventHandler<E>>,
    ) -> Result<Self, EventHandlingError> {
        if kinds.is_empty() {
            return Err(EventHandlingError::NoEventKinds);
        }
        for kind in kinds {
            if self.handlers.contains_key(*kind) {
                return Err(EventHandlingError::DuplicateHandler((*kind).to_string()));
            }
            self.handlers.insert((*kind).to_string(), handler.clone());
        }
        Ok(self)
    }

    pub fn build(self) -> Result<RoutingEventListener<E>, EventHandlingError> {
        if self.handlers.is_empty() {
            return Err(EventHandlingError::NoEventKinds);
        }
        Ok(RoutingEventListener {
            handlers: self.handlers,
        })
    }
}

#[async_trait]
impl<E: DomainEvent> EventListener<E> for RoutingEventListener<E> {
    async fn on_event(&self, event: &E) -> anyhow::Result<()> {
        let handler = self
            .handlers
            .get(event.kind())
            .ok_or_else(|| EventHandlingError::UnsupportedEvent(event.kind().to_string()))?;
        handler.handle(event).await
    }
}
