//! Agent capabilities: the units of work chained by the orchestrator.
//!
//! An agent takes text and produces text, or fails with a classified
//! [`AgentError`]. The classification drives retry decisions: only
//! [`FailureKind::Transient`] failures are retried.
//!
//! ```text
//! ChainDefinition ──► AgentDef ──► build_agent()
//!                                      │
//!                     ┌────────────────┼───────────────┐
//!                 LlmAgent (openai)  LlmAgent (anthropic)  EchoAgent
//! ```

pub mod caller;
pub mod echo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use caller::{LlmAdapter, LlmAgent};
pub use echo::EchoAgent;

/// How a failed agent invocation should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Worth retrying (network hiccup, rate limit, upstream 5xx).
    Transient,
    /// Retrying cannot help (malformed request, auth failure, bad response).
    Fatal,
    /// The invocation exceeded its wall-clock bound. Never retried.
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Timeout => "timeout",
        }
    }
}

/// A classified agent failure.
///
/// `Display` renders only the detail so the message can be surfaced verbatim
/// in a `failed` progress event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct AgentError {
    pub kind: FailureKind,
    pub detail: String,
}

impl AgentError {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, detail)
    }

    pub fn fatal(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Fatal, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, detail)
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Anything that can turn one piece of text into another.
///
/// Implementations must be cancel-safe: the timeout guard drops the returned
/// future when the step bound expires, and its result is discarded.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// Unique display name of this agent within its chain.
    fn name(&self) -> &str;

    async fn run(&self, input: &str) -> Result<String, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display_is_detail_only() {
        let err = AgentError::transient("connection reset by peer");
        assert_eq!(err.to_string(), "connection reset by peer");
        assert!(err.is_transient());
        assert!(!AgentError::fatal("bad request").is_transient());
        assert!(!AgentError::timeout("too slow").is_transient());
    }

    #[test]
    fn test_failure_kind_names() {
        assert_eq!(FailureKind::Transient.as_str(), "transient");
        assert_eq!(FailureKind::Fatal.as_str(), "fatal");
        assert_eq!(FailureKind::Timeout.as_str(), "timeout");
        assert_eq!(
            serde_json::to_string(&FailureKind::Timeout).unwrap(),
            "\"timeout\""
        );
    }
}
