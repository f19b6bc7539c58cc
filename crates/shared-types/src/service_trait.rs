//! # Service Trait - Connector Lifecycle
//!
//! Defines the lifecycle contract every discovery service implements so a
//! registry can start, stop and monitor it without knowing its source.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──start()──→ Started ──run()──→ Running ──stop()──→ Stopped
//!                         └──────────────stop()──────────────────┘
//! ```
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{Service, ServiceError, ServiceStatus, SourceIdentity};
//! use async_trait::async_trait;
//!
//! pub struct MyService { /* ... */ }
//!
//! #[async_trait]
//! impl Service for MyService {
//!     fn identity(&self) -> &SourceIdentity { &self.identity }
//!     async fn start(&self) -> Result<(), ServiceError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), ServiceError> { Ok(()) }
//!     fn status(&self) -> ServiceStatus { ServiceStatus::Healthy }
//! }
//! ```

use crate::entities::SourceIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of a discovery service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Constructed; rate limiter not configured.
    Created,
    /// `start()` completed; accepts direct requests.
    Started,
    /// Consuming requests from the bus.
    Running,
    /// No further requests are accepted.
    Stopped,
}

impl ServiceState {
    /// True while requests are accepted.
    #[must_use]
    pub fn accepts_requests(&self) -> bool {
        matches!(self, Self::Started | Self::Running)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Started => 1,
            Self::Running => 2,
            Self::Stopped => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Started,
            2 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Started => write!(f, "Started"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Lock-free cell holding a `ServiceState`.
#[derive(Debug)]
pub struct AtomicServiceState(std::sync::atomic::AtomicU8);

impl AtomicServiceState {
    /// Create a cell in the given state.
    pub fn new(state: ServiceState) -> Self {
        Self(std::sync::atomic::AtomicU8::new(state.as_u8()))
    }

    /// Current state.
    pub fn load(&self) -> ServiceState {
        ServiceState::from_u8(self.0.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Unconditionally set the state, returning the previous one.
    pub fn swap(&self, state: ServiceState) -> ServiceState {
        ServiceState::from_u8(
            self.0
                .swap(state.as_u8(), std::sync::atomic::Ordering::AcqRel),
        )
    }

    /// Move from `from` to `to`; returns the actual state on failure.
    pub fn transition(&self, from: ServiceState, to: ServiceState) -> Result<(), ServiceState> {
        self.0
            .compare_exchange(
                from.as_u8(),
                to.as_u8(),
                std::sync::atomic::Ordering::AcqRel,
                std::sync::atomic::Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(ServiceState::from_u8)
    }
}

/// Health status reported to registries and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    /// Running normally.
    Healthy,
    /// Running, but the source has been failing.
    Degraded,
    /// Not yet started.
    Idle,
    /// Stopped.
    Stopped,
}

/// Errors from service construction and lifecycle operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Built without a source adapter.
    #[error("service has no source adapter")]
    MissingAdapter,

    /// Built without an identity.
    #[error("service has no identity")]
    MissingIdentity,

    /// Lifecycle call not allowed in the current state.
    #[error("[{service}] cannot {action} while {state}")]
    InvalidTransition {
        service: String,
        action: &'static str,
        state: ServiceState,
    },
}

/// The core trait every discovery service implements.
#[async_trait]
pub trait Service: Send + Sync {
    /// Fixed identity of the service.
    fn identity(&self) -> &SourceIdentity;

    /// Human-readable name.
    fn name(&self) -> &str {
        &self.identity().display_name
    }

    /// Prepare the service to accept requests.
    async fn start(&self) -> Result<(), ServiceError>;

    /// Stop accepting requests. In-flight work is allowed to finish.
    async fn stop(&self) -> Result<(), ServiceError>;

    /// Current lifecycle state.
    fn state(&self) -> ServiceState;

    /// Current health.
    fn status(&self) -> ServiceStatus;

    /// Service-specific metrics as JSON.
    fn metrics(&self) -> serde_json::Value {
        serde_json::json!({
            "service": self.name(),
            "status": "no_metrics"
        })
    }
}
