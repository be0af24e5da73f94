//! Workflow engine: sequential agent chain orchestration.
//!
//! A chain is a fixed, ordered list of agents defined once at startup
//! (from YAML or the built-in research chain). Every request runs the whole
//! chain, threading each agent's output into the next agent.
//!
//! # Architecture
//!
//! ```text
//! chain.yaml ──► ChainDefinition ──► Vec<Arc<dyn AgentCapability>>
//!                                              │
//!                                        Orchestrator
//!                                              │  (per step)
//!                          RetryPolicy ─► TimeoutGuard ─► AgentCapability
//!                                              │
//!                                   mpsc ──► WorkflowStream ──► SSE
//! ```

pub mod executor;
pub mod retry;
pub mod schema;
pub mod state;
pub mod timeout;

pub use executor::{Orchestrator, OrchestratorConfig, WorkflowStream, DEFAULT_EVENT_BUFFER};
pub use retry::RetryPolicy;
pub use schema::{resolve_env_vars, AgentDef, ChainDefinition, DEFAULT_MODELS};
pub use state::{InvalidTransition, Transition, WorkflowState};
pub use timeout::TimeoutGuard;
