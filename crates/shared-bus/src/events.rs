//! # Discovery Events
//!
//! Defines the envelope, topics and priorities of everything that flows
//! through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{DiscoveryRequest, LogMessage};
use std::fmt;
use uuid::Uuid;

/// Topics for addressing and subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Inbound work for discovery services.
    Request,
    /// Names found by a service.
    NewName,
    /// Diagnostics (adapter failures).
    Log,
}

impl EventTopic {
    /// Wire name of the topic.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::NewName => "new-name",
            Self::Log => "log",
        }
    }

    /// Whether events on this topic may be discarded under overload.
    ///
    /// Only diagnostics are lossy; requests and names never are.
    #[must_use]
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Log)
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority. Higher priorities are handed to subscribers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Background work (e.g. bulk requests from an orchestrator).
    Low,
    /// Normal output of discovery services.
    High,
    /// Must jump every queue.
    Critical,
}

impl Priority {
    /// Number of priority levels.
    pub const LEVELS: usize = 3;

    /// Queue index, `0` being the lowest priority.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::High => 1,
            Self::Critical => 2,
        }
    }
}

/// Payload carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// A discovery request (inbound work or a discovered name).
    Request(DiscoveryRequest),
    /// A diagnostic message.
    Log(LogMessage),
}

impl From<DiscoveryRequest> for EventPayload {
    fn from(request: DiscoveryRequest) -> Self {
        Self::Request(request)
    }
}

impl From<LogMessage> for EventPayload {
    fn from(message: LogMessage) -> Self {
        Self::Log(message)
    }
}

/// The envelope delivered to subscribers.
///
/// Each subscriber receives its own clone; nothing is retained by the bus
/// after delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Unique identifier, shared by every copy of one publication.
    pub id: Uuid,
    /// Topic the event was published on.
    pub topic: EventTopic,
    /// Delivery priority.
    pub priority: Priority,
    /// The payload.
    pub payload: EventPayload,
}

impl BusEvent {
    /// Wrap a payload in a fresh envelope.
    pub fn new(topic: EventTopic, priority: Priority, payload: impl Into<EventPayload>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            priority,
            payload: payload.into(),
        }
    }

    /// The request payload, if any.
    #[must_use]
    pub fn as_request(&self) -> Option<&DiscoveryRequest> {
        match &self.payload {
            EventPayload::Request(request) => Some(request),
            EventPayload::Log(_) => None,
        }
    }

    /// The log payload, if any.
    #[must_use]
    pub fn as_log(&self) -> Option<&LogMessage> {
        match &self.payload {
            EventPayload::Log(message) => Some(message),
            EventPayload::Request(_) => None,
        }
    }

    /// Consume the envelope, returning the request payload.
    #[must_use]
    pub fn into_request(self) -> Option<DiscoveryRequest> {
        match self.payload {
            EventPayload::Request(request) => Some(request),
            EventPayload::Log(_) => None,
        }
    }
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: EventTopic) -> Self {
        Self {
            topics: vec![topic],
        }
    }

    /// Check if a topic passes this filter.
    #[must_use]
    pub fn matches_topic(&self, topic: EventTopic) -> bool {
        self.topics.is_empty() || self.topics.contains(&topic)
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BusEvent) -> bool {
        self.matches_topic(event.topic)
    }
}
