//! Static source adapter.
//!
//! Returns a fixed candidate list (or a fixed error) for every request.
//! Used to compose services without network access.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    with_cancellation, CancellationToken, DiscoveryConfig, SourceAdapter, SourceError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Number of most recent calls kept in the call log.
pub const CALL_LOG_CAPACITY: usize = 64;

/// Adapter answering every request with the same result.
///
/// Clones share the call log and the call counter.
#[derive(Debug, Clone)]
pub struct StaticSource {
    result: Result<Arc<Vec<String>>, SourceError>,
    delay: Duration,
    calls: Arc<Mutex<VecDeque<(String, String)>>>,
    invocations: Arc<AtomicUsize>,
}

impl StaticSource {
    /// Answer with `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_result(Ok(Arc::new(names.into_iter().map(Into::into).collect())))
    }

    /// Answer with an error.
    pub fn failing(error: SourceError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<Arc<Vec<String>>, SourceError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(VecDeque::with_capacity(CALL_LOG_CAPACITY))),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait `delay` before answering (cancellable).
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `(anchor, root_domain)` of the most recent calls, oldest first.
    ///
    /// At most [`CALL_LOG_CAPACITY`] entries are kept.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().iter().cloned().collect()
    }

    /// Number of calls so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    fn record_call(&self, anchor: &str, root_domain: &str) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let mut calls = self.calls.lock();
        if calls.len() == CALL_LOG_CAPACITY {
            calls.pop_front();
        }
        calls.push_back((anchor.to_string(), root_domain.to_string()));
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    async fn discover(
        &self,
        cancel: &CancellationToken,
        _config: &DiscoveryConfig,
        anchor: &str,
        root_domain: &str,
    ) -> Result<Vec<String>, SourceError> {
        self.record_call(anchor, root_domain);

        with_cancellation(cancel, async {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.result {
                Ok(names) => Ok(names.as_ref().clone()),
                Err(e) => Err(e.clone()),
            }
        })
        .await
    }
}
