//! Step timeout guard.
//!
//! Bounds a single agent invocation. On expiry the in-flight future is
//! dropped (its result, if any, is discarded) and a
//! [`FailureKind::Timeout`](crate::agents::FailureKind) failure is returned.

use std::time::Duration;

use crate::agents::{AgentCapability, AgentError};

/// Default per-step bound.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    limit: Duration,
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_TIMEOUT)
    }
}

impl TimeoutGuard {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn run(&self, agent: &dyn AgentCapability, input: &str) -> Result<String, AgentError> {
        match tokio::time::timeout(self.limit, agent.run(input)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::timeout(format!(
                "{} timed out after {}",
                agent.name(),
                format_limit(self.limit)
            ))),
        }
    }
}

/// `30s`, `1.5s`, `250ms`
pub fn format_limit(limit: Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else if limit < Duration::from_secs(1) {
        format!("{}ms", limit.as_millis())
    } else {
        format!("{}s", limit.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::FailureKind;
    use crate::testing::ScriptedAgent;

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(Duration::from_secs(30)), "30s");
        assert_eq!(format_limit(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_limit(Duration::from_millis(250)), "250ms");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_agent_times_out() {
        let agent = ScriptedAgent::hanging("Slow");
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        let err = guard.run(&agent, "in").await.unwrap_err();

        assert_eq!(err.kind, FailureKind::Timeout);
        assert_eq!(err.detail, "Slow timed out after 5s");
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(agent.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_agent_passes_through() {
        let agent = ScriptedAgent::succeeding("Fast", "out");
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        assert_eq!(guard.run(&agent, "in").await.unwrap(), "out");

        let failing = ScriptedAgent::always_failing("Bad", FailureKind::Fatal, "nope");
        let err = guard.run(&failing, "in").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);
    }
}
