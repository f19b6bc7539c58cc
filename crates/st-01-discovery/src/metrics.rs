//! Metrics for discovery service operations
//!
//! Lock-free counters recording what happened to every request a service
//! received, including the ones dropped before any work was done.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Why a request was dropped without work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// The service was not started, or already stopped.
    NotRunning,
    /// `name` or `domain` was empty.
    EmptyField,
    /// The scope filter rejected `name`.
    OutOfScope,
}

/// Metrics collector for one discovery service
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Requests handed to `on_request`
    pub requests_received: AtomicU64,
    /// Dropped: service not running
    pub dropped_not_running: AtomicU64,
    /// Dropped: empty name or domain
    pub dropped_empty: AtomicU64,
    /// Dropped: out of scope
    pub dropped_out_of_scope: AtomicU64,
    /// Rate limiter acquisitions
    pub limiter_acquisitions: AtomicU64,
    /// Adapter calls started
    pub adapter_invocations: AtomicU64,
    /// Adapter calls that failed (cancellation excluded)
    pub adapter_failures: AtomicU64,
    /// Requests ended by cancellation
    pub cancellations: AtomicU64,
    /// Names published on the bus
    pub names_published: AtomicU64,
    /// Failures since the last successful adapter call
    consecutive_failures: AtomicU64,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming request
    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped request
    pub fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::NotRunning => &self.dropped_not_running,
            DropReason::EmptyField => &self.dropped_empty,
            DropReason::OutOfScope => &self.dropped_out_of_scope,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rate limiter acquisition
    pub fn record_acquisition(&self) {
        self.limiter_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an adapter call
    pub fn record_invocation(&self) {
        self.adapter_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an adapter failure
    pub fn record_failure(&self) {
        self.adapter_failures.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful adapter call publishing `count` names
    pub fn record_success(&self, count: usize) {
        self.names_published
            .fetch_add(count as u64, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Record a cancelled request
    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Failures since the last successful adapter call
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            dropped_not_running: self.dropped_not_running.load(Ordering::Relaxed),
            dropped_empty: self.dropped_empty.load(Ordering::Relaxed),
            dropped_out_of_scope: self.dropped_out_of_scope.load(Ordering::Relaxed),
            limiter_acquisitions: self.limiter_acquisitions.load(Ordering::Relaxed),
            adapter_invocations: self.adapter_invocations.load(Ordering::Relaxed),
            adapter_failures: self.adapter_failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            names_published: self.names_published.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of service metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub dropped_not_running: u64,
    pub dropped_empty: u64,
    pub dropped_out_of_scope: u64,
    pub limiter_acquisitions: u64,
    pub adapter_invocations: u64,
    pub adapter_failures: u64,
    pub cancellations: u64,
    pub names_published: u64,
}

impl MetricsSnapshot {
    /// Requests dropped before any work, for any reason
    pub fn dropped(&self) -> u64 {
        self.dropped_not_running + self.dropped_empty + self.dropped_out_of_scope
    }
}
