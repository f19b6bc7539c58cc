//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{BusEvent, EventFilter, EventPayload, EventTopic, Priority};
use crate::mailbox::{Delivery, Mailbox};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Registered mailboxes, keyed by subscription id.
pub(crate) type MailboxRegistry = Arc<RwLock<HashMap<u64, Arc<Mailbox>>>>;

/// Trait for publishing events to the bus.
///
/// This is the only interface discovery services need: they publish names
/// and diagnostics without knowing who consumes them.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Arguments
    ///
    /// * `topic` - Topic to publish on
    /// * `priority` - Delivery priority
    /// * `payload` - The payload
    ///
    /// # Returns
    ///
    /// The number of subscribers whose mailbox accepted the event.
    async fn publish(&self, topic: EventTopic, priority: Priority, payload: EventPayload) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;

    /// Get the number of per-subscriber copies discarded under overload.
    fn events_dropped(&self) -> u64 {
        0
    }
}

/// In-memory implementation of the event bus.
///
/// Each subscription owns a bounded priority mailbox; publishing copies the
/// event into every mailbox whose filter matches. Subscribers only see
/// events published after they subscribed.
pub struct InMemoryEventBus {
    /// Active mailboxes.
    mailboxes: MailboxRegistry,

    /// Next subscription id.
    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    /// Per-subscriber copies discarded (log overload).
    events_dropped: AtomicU64,

    /// Set once `close()` has been called.
    closed: AtomicBool,

    /// Per-subscriber mailbox capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mailboxes: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Returns a `Subscription` handle that can be used to receive events.
    /// After `close()` the returned subscription is already closed.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mailbox = Arc::new(Mailbox::new(filter, self.capacity));

        {
            // Checked under the registry lock so close() cannot drain in between.
            let mut mailboxes = self.mailboxes.write();
            if self.is_closed() {
                mailbox.close();
            } else {
                mailboxes.insert(id, mailbox.clone());
            }
        }

        debug!(id, topics = ?mailbox.filter().topics, "New subscription created");

        Subscription::new(id, mailbox, self.mailboxes.clone())
    }

    /// Get a stream of events matching a filter.
    ///
    /// This is a convenience method that returns an `EventStream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.mailboxes.read().len()
    }

    /// Get the per-subscriber mailbox capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the bus has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the bus.
    ///
    /// Publishing becomes a no-op, blocked publishers are released and
    /// subscribers receive `None` once their mailbox is drained.
    pub fn close(&self) {
        let mailboxes: Vec<Arc<Mailbox>> = {
            let mut registry = self.mailboxes.write();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            registry.drain().map(|(_, m)| m).collect()
        };
        for mailbox in &mailboxes {
            mailbox.close();
        }
        debug!(subscribers = mailboxes.len(), "Event bus closed");
    }

    /// Snapshot of the mailboxes accepting `topic`. The registry lock is
    /// released before any delivery is awaited.
    fn targets(&self, topic: EventTopic) -> Vec<Arc<Mailbox>> {
        self.mailboxes
            .read()
            .values()
            .filter(|mailbox| mailbox.filter().matches_topic(topic))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InMemoryEventBus {
    fn drop(&mut self) {
        self.close();
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: EventTopic, priority: Priority, payload: EventPayload) -> usize {
        if self.is_closed() {
            trace!(%topic, "Publish on closed bus ignored");
            return 0;
        }

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let event = BusEvent::new(topic, priority, payload);
        let targets = self.targets(topic);
        if targets.is_empty() {
            trace!(%topic, "Event published with no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for mailbox in targets {
            match mailbox.deliver(event.clone()).await {
                Delivery::Queued => delivered += 1,
                Delivery::Evicted => {
                    delivered += 1;
                    self.events_dropped.fetch_add(1, Ordering::Relaxed);
                }
                Delivery::Discarded => {
                    self.events_dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(%topic, id = %event.id, "Subscriber mailbox full, event discarded");
                }
                // Unsubscribed while we were delivering.
                Delivery::Closed => {}
            }
        }

        debug!(
            %topic,
            ?priority,
            id = %event.id,
            receivers = delivered,
            "Event published"
        );
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }
}
