//! # Service Registry
//!
//! Holds the discovery services of one pipeline, drives their lifecycle
//! together and wires each one to the bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = ServiceRegistry::new();
//! registry.register(DiscoveryService::archive(ArchiveSource::open_uk_archive()?));
//!
//! registry.start_all().await?;
//! let handles = registry.spawn_all(&ctx, bus.as_ref());
//!
//! registry.dispatch(&ctx, DiscoveryRequest::new("www.example.com", "example.com")).await;
//!
//! // Later: graceful shutdown
//! registry.stop_all().await;
//! ```

use crate::context::RequestContext;
use crate::service::DiscoveryService;
use shared_bus::{EventFilter, EventSubscriber, EventTopic, Priority};
use shared_types::{DiscoveryRequest, Service, ServiceError, ServiceStatus};
use std::sync::Arc;
use subtrace_telemetry::service_span;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

/// Registry of discovery services.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<DiscoveryService>>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service.
    ///
    /// Names are not required to be unique, but duplicates are reported.
    pub fn register(&mut self, service: DiscoveryService) -> Arc<DiscoveryService> {
        info!("[Registry] Registering service {}", service.name());

        if self.get(service.name()).is_some() {
            warn!(
                "[Registry] Service {} already registered, both will run",
                service.name()
            );
        }

        let service = Arc::new(service);
        self.services.push(Arc::clone(&service));
        service
    }

    /// First service registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<DiscoveryService>> {
        self.services.iter().find(|s| s.name() == name)
    }

    /// All registered services, in registration order.
    pub fn services(&self) -> &[Arc<DiscoveryService>] {
        &self.services
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start every service.
    ///
    /// Every service is attempted; the first error is returned.
    pub async fn start_all(&self) -> Result<(), ServiceError> {
        info!("[Registry] Starting {} services", self.services.len());

        let mut first_error = None;
        for service in &self.services {
            if let Err(e) = service.start().await {
                error!("[Registry] ✗ {} failed to start: {}", service.name(), e);
                first_error.get_or_insert(e);
                continue;
            }
            info!("[Registry] ✓ {} started", service.name());
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Stop every service.
    pub async fn stop_all(&self) {
        info!("[Registry] Stopping all services");

        for service in self.services.iter().rev() {
            // stop() is infallible for discovery services
            let _ = service.stop().await;
        }
    }

    /// Subscribe every service to the `request` topic and run it on its own
    /// task.
    ///
    /// Subscriptions are created before this returns, so requests
    /// dispatched afterwards reach every service.
    pub fn spawn_all<B>(
        &self,
        ctx: &RequestContext,
        bus: &B,
    ) -> Vec<JoinHandle<Result<(), ServiceError>>>
    where
        B: EventSubscriber + ?Sized,
    {
        self.services
            .iter()
            .map(|service| {
                let subscription = bus.subscribe(EventFilter::topic(EventTopic::Request));
                let service = Arc::clone(service);
                let ctx = ctx.clone();
                let span = service_span!("discovery_service", service = %service.name());
                tokio::spawn(async move { service.run(ctx, subscription).await }.instrument(span))
            })
            .collect()
    }

    /// Publish a request for every running service.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn dispatch(&self, ctx: &RequestContext, request: DiscoveryRequest) -> usize {
        ctx.bus()
            .publish(EventTopic::Request, Priority::Low, request.into())
            .await
    }

    /// Health of every service.
    pub fn health(&self) -> Vec<(String, ServiceStatus)> {
        self.services
            .iter()
            .map(|s| (s.name().to_string(), s.status()))
            .collect()
    }

    /// Metrics of every service as a JSON array.
    pub fn metrics(&self) -> serde_json::Value {
        serde_json::Value::Array(self.services.iter().map(|s| s.metrics()).collect())
    }
}
