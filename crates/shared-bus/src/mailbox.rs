//! # Subscriber Mailbox
//!
//! Bounded, priority-ordered queue owned by one subscription.
//!
//! ## Overload
//!
//! When a mailbox is full:
//! - `Request` and `NewName` publishers wait for space (never lost)
//! - `Log` evicts the oldest queued log event; if the mailbox holds no
//!   log event, the incoming one is discarded
//!
//! The state lock is a `parking_lot::Mutex` and is never held across an
//! await point.

use crate::events::{BusEvent, EventFilter, Priority};
use crate::subscriber::SubscriptionError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// Result of offering an event to a mailbox.
#[derive(Debug)]
pub(crate) enum Delivery {
    /// Queued.
    Queued,
    /// Queued after evicting an older log event.
    Evicted,
    /// Discarded (lossy topic, no room).
    Discarded,
    /// The mailbox is closed.
    Closed,
}

enum Offer {
    Done(Delivery),
    Full(BusEvent),
}

#[derive(Default)]
struct MailboxState {
    /// One FIFO per priority level, indexed by `Priority::index`.
    queues: [VecDeque<BusEvent>; Priority::LEVELS],
    len: usize,
    closed: bool,
}

impl MailboxState {
    fn push(&mut self, event: BusEvent) {
        self.queues[event.priority.index()].push_back(event);
        self.len += 1;
    }

    /// Oldest event of the highest non-empty priority.
    fn pop(&mut self) -> Option<BusEvent> {
        let event = self
            .queues
            .iter_mut()
            .rev()
            .find_map(|queue| queue.pop_front())?;
        self.len -= 1;
        Some(event)
    }

    /// Remove the oldest lossy event, lowest priority first.
    fn evict_lossy(&mut self) -> bool {
        for queue in &mut self.queues {
            if let Some(pos) = queue.iter().position(|e| e.topic.is_lossy()) {
                queue.remove(pos);
                self.len -= 1;
                return true;
            }
        }
        false
    }
}

pub(crate) struct Mailbox {
    filter: EventFilter,
    capacity: usize,
    state: Mutex<MailboxState>,
    /// Signalled when an event is queued (or on close).
    readable: Notify,
    /// Signalled when space frees up (or on close).
    writable: Notify,
}

impl Mailbox {
    pub(crate) fn new(filter: EventFilter, capacity: usize) -> Self {
        Self {
            filter,
            capacity: capacity.max(1),
            state: Mutex::new(MailboxState::default()),
            readable: Notify::new(),
            writable: Notify::new(),
        }
    }

    pub(crate) fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().len
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn offer(&self, event: BusEvent) -> Offer {
        let delivery = {
            let mut state = self.state.lock();
            if state.closed {
                return Offer::Done(Delivery::Closed);
            }
            if state.len < self.capacity {
                state.push(event);
                Delivery::Queued
            } else if !event.topic.is_lossy() {
                return Offer::Full(event);
            } else if state.evict_lossy() {
                state.push(event);
                Delivery::Evicted
            } else {
                return Offer::Done(Delivery::Discarded);
            }
        };
        self.readable.notify_one();
        Offer::Done(delivery)
    }

    /// Queue an event, waiting for space when the topic is not lossy.
    pub(crate) async fn deliver(&self, mut event: BusEvent) -> Delivery {
        loop {
            let notified = self.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.offer(event) {
                Offer::Done(delivery) => return delivery,
                Offer::Full(returned) => {
                    event = returned;
                    notified.await;
                }
            }
        }
    }

    /// Wait for the next event. `None` once closed and drained.
    pub(crate) async fn recv(&self) -> Option<BusEvent> {
        loop {
            let notified = self.readable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_recv() {
                Ok(Some(event)) => return Some(event),
                Ok(None) => notified.await,
                Err(SubscriptionError::Closed) => return None,
            }
        }
    }

    /// Take the next event without waiting.
    pub(crate) fn try_recv(&self) -> Result<Option<BusEvent>, SubscriptionError> {
        let popped = {
            let mut state = self.state.lock();
            match state.pop() {
                Some(event) => Some(event),
                None if state.closed => return Err(SubscriptionError::Closed),
                None => None,
            }
        };
        if popped.is_some() {
            self.writable.notify_one();
        }
        Ok(popped)
    }

    /// Refuse further events and wake every waiter.
    ///
    /// Already queued events remain receivable.
    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.readable.notify_waiters();
        self.writable.notify_waiters();
    }

    /// Close and discard anything queued.
    pub(crate) fn close_and_clear(&self) {
        {
            let mut state = self.state.lock();
            state.closed = true;
            state.queues.iter_mut().for_each(VecDeque::clear);
            state.len = 0;
        }
        self.readable.notify_waiters();
        self.writable.notify_waiters();
    }
}
