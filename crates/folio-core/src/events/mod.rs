//! Domain events emitted by content operations.
//!
//! Events are consumed externally — the search indexer refreshes its
//! text index from the change stream. The core only emits; it never
//! performs indexing itself.

pub mod entity;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use entity::EntityEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The principal who caused the event (if applicable).
    pub actor_id: Option<i64>,
    /// The event payload.
    pub payload: EntityEvent,
}

impl DomainEvent {
    /// Create a new domain event stamped with the current time.
    pub fn new(actor_id: Option<i64>, payload: EntityEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}

/// Consumer of emitted domain events.
///
/// The default sink logs through `tracing`; production deployments plug
/// in a sink that forwards to the search indexing pipeline.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a single event. Failures are the sink's problem — emitters
    /// never fail a write because an event could not be delivered.
    async fn emit(&self, event: DomainEvent);
}

/// Event sink that writes events to the tracing log.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

#[async_trait::async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: DomainEvent) {
        tracing::debug!(
            actor = ?event.actor_id,
            event = ?event.payload,
            "entity event"
        );
    }
}
