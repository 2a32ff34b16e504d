//! Domain event system: decoupled observation of the pipeline.
//!
//! Events are published when an exchange is stored, a completion falls back
//! to placeholder text, or a background profile refresh finishes. The event
//! bus is also the error sink for the detached refresh task, whose failures
//! would otherwise only reach the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A user turn and its reply were persisted
    ExchangeStored {
        user_id: String,
        user_turn_id: String,
        bot_turn_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A completion call failed and placeholder text was substituted
    CompletionFailed {
        purpose: String, // "reply", "summary", "personality", "worldview"
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The derived profile for a user was overwritten
    ProfileUpdated {
        user_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A background profile refresh could not be stored
    ProfileRefreshFailed {
        user_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
