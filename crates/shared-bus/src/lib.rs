//! # Shared Bus - Priority Event Bus for Discovery Services
//!
//! Publish/subscribe transport between discovery services and whatever
//! consumes their output.
//!
//! ## Topics
//!
//! | Topic      | Payload            | Published by              |
//! |------------|--------------------|---------------------------|
//! | `request`  | `DiscoveryRequest` | orchestrator / registry   |
//! | `new-name` | `DiscoveryRequest` | discovery services        |
//! | `log`      | `LogMessage`       | discovery services        |
//!
//! ## Delivery
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐   recv()   ┌──────────────┐
//! │   Service    │ ───────────→ │  Event Bus   │ ─────────→ │  Subscriber  │
//! └──────────────┘              │  (mailbox    │            └──────────────┘
//!                               │  per sub)    │
//!                               └──────────────┘
//! ```
//!
//! - Every subscriber whose filter matches gets its own copy.
//! - Within one mailbox, higher priority is delivered first; equal
//!   priority is FIFO.
//! - Subscribers see only events published after they subscribed.
//! - Mailboxes are bounded. `request` and `new-name` publishers wait for
//!   space; `log` events are the only ones ever discarded.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
mod mailbox;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusEvent, EventFilter, EventPayload, EventTopic, Priority};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
