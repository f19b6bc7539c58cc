//! # Discovery Service
//!
//! Wraps one source adapter with the gates every request passes before the
//! adapter is called, and publishes what the adapter finds.
//!
//! ## Request Pipeline
//!
//! ```text
//! on_request ─→ state ─→ fields ─→ scope ─→ limiter ─→ adapter ─┬─→ new-name (High) × k
//!                 │        │         │         │           │     └─→ log (High) on failure
//!                 └────────┴─────────┴── Dropped ──────────┴── Cancelled
//! ```
//!
//! Scope is checked before the limiter, so an out-of-scope request never
//! consumes a rate-limit slot.

use crate::adapters::SourceAdapterKind;
use crate::context::RequestContext;
use crate::metrics::{DropReason, MetricsSnapshot, ServiceMetrics};
use async_trait::async_trait;
use shared_bus::{EventTopic, Priority, Subscription};
use shared_types::{
    clean_name, with_cancellation, AtomicServiceState, CancellationToken, DiscoveryRequest,
    LogMessage, MinIntervalLimiter, Service, ServiceError, ServiceState, ServiceStatus,
    SourceAdapter, SourceIdentity,
};
use st_02_archive_source::ArchiveSource;
use std::time::Duration;
use subtrace_telemetry::{log_event, log_request_event};

/// Minimum interval between adapter calls unless configured otherwise.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Consecutive adapter failures after which the service reports `Degraded`.
pub const DEGRADED_AFTER_FAILURES: u64 = 3;

/// What happened to one request.
///
/// Informational only; `on_request` never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Rejected before any work was done.
    Dropped(DropReason),
    /// The context was cancelled; names published before that stay published.
    Cancelled,
    /// The adapter failed; one log event was published.
    Failed,
    /// The adapter succeeded; this many names were published.
    Published(usize),
}

/// A discovery service: one identity, one adapter, one rate limiter.
pub struct DiscoveryService {
    identity: SourceIdentity,
    adapter: SourceAdapterKind,
    min_interval: Duration,
    limiter: MinIntervalLimiter,
    state: AtomicServiceState,
    /// Cancelled by `stop()` to end the run loop.
    shutdown: CancellationToken,
    metrics: ServiceMetrics,
}

impl DiscoveryService {
    /// Start building a service.
    #[must_use]
    pub fn builder() -> DiscoveryServiceBuilder {
        DiscoveryServiceBuilder::default()
    }

    /// Service for a web archive with the archive identity and the default
    /// one second interval.
    #[must_use]
    pub fn archive(source: ArchiveSource) -> Self {
        Self::new(
            ArchiveSource::identity(),
            source.into(),
            DEFAULT_MIN_INTERVAL,
        )
    }

    fn new(identity: SourceIdentity, adapter: SourceAdapterKind, min_interval: Duration) -> Self {
        Self {
            identity,
            adapter,
            min_interval,
            limiter: MinIntervalLimiter::new(),
            state: AtomicServiceState::new(ServiceState::Created),
            shutdown: CancellationToken::new(),
            metrics: ServiceMetrics::new(),
        }
    }

    /// The adapter this service wraps.
    #[must_use]
    pub fn adapter(&self) -> &SourceAdapterKind {
        &self.adapter
    }

    /// Configured minimum interval between adapter calls.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// The service's rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &MinIntervalLimiter {
        &self.limiter
    }

    /// Current metrics.
    #[must_use]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Consume `Request` events from `subscription` until the service is
    /// stopped, `ctx` is cancelled or the bus closes.
    ///
    /// Requests are handled one at a time, each with a child of `ctx`.
    /// When the loop ends without `stop()` the service returns to `Started`.
    ///
    /// # Errors
    ///
    /// `ServiceError::InvalidTransition` unless the service is `Started`.
    pub async fn run(
        &self,
        ctx: RequestContext,
        mut subscription: Subscription,
    ) -> Result<(), ServiceError> {
        self.state
            .transition(ServiceState::Started, ServiceState::Running)
            .map_err(|state| self.invalid("run", state))?;

        log_event!(info, self.identity, "Service running");

        let mut handled = 0u64;
        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ctx.cancel_token().cancelled() => break,
                event = subscription.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if event.topic != EventTopic::Request {
                continue;
            }
            let Some(request) = event.into_request() else {
                continue;
            };

            self.on_request(&ctx.child(), request).await;
            handled += 1;
        }

        // Back to Started unless stop() got there first.
        let _ = self
            .state
            .transition(ServiceState::Running, ServiceState::Started);

        log_event!(info, self.identity, "Service loop ended", handled);
        Ok(())
    }

    /// Handle one request.
    ///
    /// Never fails: rejections, cancellation and adapter errors are reported
    /// through the returned outcome, the bus and the metrics.
    pub async fn on_request(
        &self,
        ctx: &RequestContext,
        request: DiscoveryRequest,
    ) -> RequestOutcome {
        self.metrics.record_request();

        if !self.state().accepts_requests() {
            return self.drop_request(DropReason::NotRunning, &request);
        }
        if !request.is_complete() {
            return self.drop_request(DropReason::EmptyField, &request);
        }
        if !ctx.config().is_domain_in_scope(&request.name) {
            return self.drop_request(DropReason::OutOfScope, &request);
        }

        let cancel = ctx.cancel_token();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(&request),
            _ = self.limiter.acquire() => self.metrics.record_acquisition(),
        }

        self.metrics.record_invocation();
        let result = with_cancellation(
            cancel,
            self.adapter
                .discover(cancel, ctx.config(), &request.name, &request.domain),
        )
        .await;

        let names = match result {
            Ok(names) => names,
            Err(e) if e.is_cancellation() => return self.cancelled(&request),
            Err(e) => {
                self.metrics.record_failure();
                log_request_event!(
                    warn,
                    self.identity,
                    "Source adapter failed",
                    request.name,
                    request.domain,
                    error = %e
                );
                let message = LogMessage::new(self.identity.display_name.clone(), e.to_string());
                ctx.bus()
                    .publish(EventTopic::Log, Priority::High, message.into())
                    .await;
                return RequestOutcome::Failed;
            }
        };

        let limit = ctx.config().max_names_per_request.unwrap_or(usize::MAX);
        let mut published = 0;
        for raw in names.into_iter().take(limit) {
            let name = clean_name(&raw);
            if name.is_empty() {
                continue;
            }
            if cancel.is_cancelled() {
                self.metrics.record_success(published);
                return self.cancelled(&request);
            }

            // A started publish always completes so every subscriber gets the name.
            let found = DiscoveryRequest::new(name, request.domain.clone()).tagged(&self.identity);
            ctx.bus()
                .publish(EventTopic::NewName, Priority::High, found.into())
                .await;
            published += 1;
        }

        self.metrics.record_success(published);
        log_request_event!(
            debug,
            self.identity,
            "Request handled",
            request.name,
            request.domain,
            published
        );
        RequestOutcome::Published(published)
    }

    fn drop_request(&self, reason: DropReason, request: &DiscoveryRequest) -> RequestOutcome {
        self.metrics.record_drop(reason);
        log_request_event!(
            debug,
            self.identity,
            "Request dropped",
            request.name,
            request.domain,
            reason = ?reason
        );
        RequestOutcome::Dropped(reason)
    }

    fn cancelled(&self, request: &DiscoveryRequest) -> RequestOutcome {
        self.metrics.record_cancellation();
        log_request_event!(
            debug,
            self.identity,
            "Request cancelled",
            request.name,
            request.domain
        );
        RequestOutcome::Cancelled
    }

    fn invalid(&self, action: &'static str, state: ServiceState) -> ServiceError {
        ServiceError::InvalidTransition {
            service: self.identity.display_name.clone(),
            action,
            state,
        }
    }
}

impl std::fmt::Debug for DiscoveryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryService")
            .field("identity", &self.identity)
            .field("adapter", &self.adapter.kind())
            .field("state", &self.state())
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

#[async_trait]
impl Service for DiscoveryService {
    fn identity(&self) -> &SourceIdentity {
        &self.identity
    }

    async fn start(&self) -> Result<(), ServiceError> {
        match self.state.load() {
            ServiceState::Started | ServiceState::Running => return Ok(()),
            ServiceState::Stopped => return Err(self.invalid("start", ServiceState::Stopped)),
            ServiceState::Created => {}
        }

        // Configure before becoming visible as Started.
        self.limiter.configure(self.min_interval);

        match self
            .state
            .transition(ServiceState::Created, ServiceState::Started)
        {
            Ok(()) | Err(ServiceState::Started | ServiceState::Running) => {}
            Err(state) => return Err(self.invalid("start", state)),
        }

        log_event!(
            info,
            self.identity,
            "Service started",
            min_interval_ms = self.min_interval.as_millis() as u64
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let previous = self.state.swap(ServiceState::Stopped);
        self.shutdown.cancel();
        if previous != ServiceState::Stopped {
            log_event!(info, self.identity, "Service stopped", previous = %previous);
        }
        Ok(())
    }

    fn state(&self) -> ServiceState {
        self.state.load()
    }

    fn status(&self) -> ServiceStatus {
        match self.state() {
            ServiceState::Created => ServiceStatus::Idle,
            ServiceState::Stopped => ServiceStatus::Stopped,
            ServiceState::Started | ServiceState::Running => {
                if self.metrics.consecutive_failures() >= DEGRADED_AFTER_FAILURES {
                    ServiceStatus::Degraded
                } else {
                    ServiceStatus::Healthy
                }
            }
        }
    }

    fn metrics(&self) -> serde_json::Value {
        serde_json::json!({
            "service": self.name(),
            "source_type": self.identity.source_type,
            "state": self.state().to_string(),
            "status": self.status(),
            "metrics": self.metrics.snapshot(),
        })
    }
}

/// Builder for [`DiscoveryService`].
#[derive(Debug, Default)]
pub struct DiscoveryServiceBuilder {
    identity: Option<SourceIdentity>,
    adapter: Option<SourceAdapterKind>,
    min_interval: Option<Duration>,
}

impl DiscoveryServiceBuilder {
    /// Set the identity published results are tagged with.
    #[must_use]
    pub fn identity(mut self, identity: SourceIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the source adapter.
    #[must_use]
    pub fn adapter(mut self, adapter: impl Into<SourceAdapterKind>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    /// Set the minimum interval between adapter calls (default one second).
    #[must_use]
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = Some(min_interval);
        self
    }

    /// Build the service in the `Created` state.
    ///
    /// # Errors
    ///
    /// `ServiceError::MissingAdapter` or `ServiceError::MissingIdentity`.
    pub fn build(self) -> Result<DiscoveryService, ServiceError> {
        let adapter = self.adapter.ok_or(ServiceError::MissingAdapter)?;
        let identity = self.identity.ok_or(ServiceError::MissingIdentity)?;
        Ok(DiscoveryService::new(
            identity,
            adapter,
            self.min_interval.unwrap_or(DEFAULT_MIN_INTERVAL),
        ))
    }
}
