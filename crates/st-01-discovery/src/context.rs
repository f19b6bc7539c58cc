//! # Request Context
//!
//! Everything a service needs to handle one request: configuration, the bus
//! to publish on and a cancellation token. Both configuration and bus are
//! required; a context missing either cannot be built.

use crate::error::ContextError;
use shared_bus::EventPublisher;
use shared_types::{CancellationToken, DiscoveryConfig};
use std::fmt;
use std::sync::Arc;

/// Request-scoped context handed to `DiscoveryService::on_request`.
#[derive(Clone)]
pub struct RequestContext {
    config: Arc<DiscoveryConfig>,
    bus: Arc<dyn EventPublisher>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Start building a context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Discovery configuration.
    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Bus results are published on.
    #[must_use]
    pub fn bus(&self) -> &Arc<dyn EventPublisher> {
        &self.bus
    }

    /// Cancellation token for this context.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Context for a single request.
    ///
    /// Shares configuration and bus; its token is cancelled with the parent
    /// but cancelling it leaves the parent untouched.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            bus: Arc::clone(&self.bus),
            cancel: self.cancel.child_token(),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("config", &self.config)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestContext`].
#[derive(Default)]
pub struct RequestContextBuilder {
    config: Option<Arc<DiscoveryConfig>>,
    bus: Option<Arc<dyn EventPublisher>>,
    cancel: Option<CancellationToken>,
}

impl RequestContextBuilder {
    /// Set the discovery configuration.
    #[must_use]
    pub fn config(mut self, config: impl Into<Arc<DiscoveryConfig>>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Set the event bus.
    #[must_use]
    pub fn bus(mut self, bus: Arc<dyn EventPublisher>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Use an existing cancellation token (a fresh one otherwise).
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the context.
    ///
    /// # Errors
    ///
    /// `ContextError::MissingConfig` or `ContextError::MissingBus` when the
    /// corresponding value was not supplied.
    pub fn build(self) -> Result<RequestContext, ContextError> {
        Ok(RequestContext {
            config: self.config.ok_or(ContextError::MissingConfig)?,
            bus: self.bus.ok_or(ContextError::MissingBus)?,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}
