//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{BusEvent, EventFilter};
use crate::mailbox::Mailbox;
use crate::publisher::MailboxRegistry;
use futures::stream::{self, BoxStream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed (or the subscription cancelled) and the
    /// mailbox is drained.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for subscribing to events from the bus.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// A subscription handle for receiving events.
///
/// When dropped, the mailbox is unregistered and any publisher blocked on
/// it is released.
pub struct Subscription {
    /// Subscription id in the bus registry.
    id: u64,

    /// Mailbox owned by this subscription.
    mailbox: Arc<Mailbox>,

    /// Reference to the bus registry (for cleanup).
    registry: MailboxRegistry,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(id: u64, mailbox: Arc<Mailbox>, registry: MailboxRegistry) -> Self {
        Self {
            id,
            mailbox,
            registry,
        }
    }

    /// Receive the next event, highest priority first.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next event
    /// - `None` - The bus was closed and the mailbox is drained
    pub async fn recv(&mut self) -> Option<BusEvent> {
        self.mailbox.recv().await
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The bus was closed and the
    ///   mailbox is drained
    pub fn try_recv(&mut self) -> Result<Option<BusEvent>, SubscriptionError> {
        self.mailbox.try_recv()
    }

    /// Number of events waiting in the mailbox.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailbox.len()
    }

    /// Whether the mailbox is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.mailbox.filter()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", self.filter())
            .field("queued", &self.len())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.write().remove(&self.id);
        self.mailbox.close_and_clear();
        debug!(id = self.id, "Subscription dropped");
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream {
    filter: EventFilter,
    inner: BoxStream<'static, BusEvent>,
}

impl EventStream {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let filter = subscription.filter().clone();
        let inner = stream::unfold(subscription, |mut sub| async move {
            let event = sub.recv().await?;
            Some((event, sub))
        })
        .boxed();
        Self { filter, inner }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = BusEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
