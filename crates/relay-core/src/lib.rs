//! Relay Core: transport-agnostic domain logic for the Relay agent chain service.
//!
//! This crate drives a fixed, linear chain of model-backed agents, feeding
//! each agent's output to the next one, and emits a progress event before and
//! after every step. It has **no HTTP framework dependency** by default,
//! making it suitable for use in:
//!
//! - HTTP servers (via `relay-server`)
//! - CLI tools (via `relay-cli`)
//!
//! # Feature Flags
//!
//! - `axum` - Enables `IntoResponse` impl on `ServerError` for use in axum handlers.
//! - `testing` - Exposes scripted fake agents for integration tests.

pub mod agents;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod workflow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Convenience re-exports
pub use agents::{AgentCapability, AgentError, FailureKind};
pub use config::RelaySettings;
pub use error::{ConfigError, ServerError};
pub use events::{FinalResult, ProgressEvent, StepStatus, WorkflowMessage};
pub use metrics::{MetricsRegistry, MetricsSink, NoopMetrics};
pub use workflow::{ChainDefinition, Orchestrator, OrchestratorConfig, WorkflowStream};
