//! # Rate Limiter
//!
//! Minimum-interval gate protecting external sources from a single service.
//!
//! ## Semantics
//!
//! - Each discovery service owns exactly one limiter; limiters are never
//!   shared between services.
//! - `acquire()` suspends only the calling task until `min_interval` has
//!   elapsed since the previous successful acquisition on this instance.
//! - Waiters are served in lock order; no further fairness is promised.
//!
//! Built on `tokio::time`, so paused test clocks drive it deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval rate limiter.
///
/// # Algorithm
///
/// Keeps the instant of the last release:
/// - An acquisition waits until `last_release + min_interval`
/// - A completed acquisition records `now` as the new release
/// - An abandoned acquisition (future dropped) records nothing
pub struct MinIntervalLimiter {
    /// Minimum gap between releases, in nanoseconds.
    min_interval_ns: AtomicU64,
    /// Last successful release.
    last_release: Mutex<Option<Instant>>,
    /// Completed acquisitions.
    acquisitions: AtomicU64,
}

impl MinIntervalLimiter {
    /// Create an unconfigured limiter (no gating until `configure`).
    pub fn new() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Create a limiter with the given minimum interval.
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval_ns: AtomicU64::new(duration_to_ns(min_interval)),
            last_release: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Set the minimum interval. The last release time is kept.
    pub fn configure(&self, min_interval: Duration) {
        self.min_interval_ns
            .store(duration_to_ns(min_interval), Ordering::Release);
    }

    /// Current minimum interval.
    pub fn min_interval(&self) -> Duration {
        Duration::from_nanos(self.min_interval_ns.load(Ordering::Acquire))
    }

    /// Wait for the gate, then record the release.
    ///
    /// Returns the release instant.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_release.lock().await;

        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval()).await;
        }

        let now = Instant::now();
        *last = Some(now);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        now
    }

    /// Acquire without waiting.
    ///
    /// Returns `true` if the gate was open (and is now closed again),
    /// `false` if the interval has not elapsed or another acquisition is
    /// in progress.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut last) = self.last_release.try_lock() else {
            return false;
        };

        let now = Instant::now();
        if let Some(previous) = *last {
            if now < previous + self.min_interval() {
                return false;
            }
        }

        *last = Some(now);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Instant of the last successful acquisition, if any.
    ///
    /// Returns `None` while an acquisition is waiting.
    pub fn last_release(&self) -> Option<Instant> {
        self.last_release.try_lock().ok().and_then(|last| *last)
    }

    /// Total completed acquisitions.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

impl Default for MinIntervalLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MinIntervalLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinIntervalLimiter")
            .field("min_interval", &self.min_interval())
            .field("acquisitions", &self.acquisitions())
            .finish()
    }
}

fn duration_to_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
