//! Scripted fake agents for tests.
//!
//! Every [`ScriptedAgent`] records how often it was called, with which
//! inputs, and when (on the tokio clock, so paused-time tests see exact
//! backoff gaps).

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::agents::{AgentCapability, AgentError, FailureKind};

#[derive(Debug, Clone)]
enum Behavior {
    /// Fail `failures` times with `kind`, then return `output`.
    FailThenOk {
        failures: usize,
        kind: FailureKind,
        output: String,
    },
    AlwaysFail {
        kind: FailureKind,
        detail: String,
    },
    /// Never completes.
    Hang,
    /// Returns `NAME(input)`.
    Echo,
    /// Sleeps, then returns `output`.
    Delay {
        delay: Duration,
        output: String,
    },
}

pub struct ScriptedAgent {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedAgent {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(name: &str, output: &str) -> Self {
        Self::failing_then_ok(name, 0, FailureKind::Transient, output)
    }

    pub fn failing_then_ok(name: &str, failures: usize, kind: FailureKind, output: &str) -> Self {
        Self::with_behavior(
            name,
            Behavior::FailThenOk {
                failures,
                kind,
                output: output.to_string(),
            },
        )
    }

    pub fn always_failing(name: &str, kind: FailureKind, detail: &str) -> Self {
        Self::with_behavior(
            name,
            Behavior::AlwaysFail {
                kind,
                detail: detail.to_string(),
            },
        )
    }

    pub fn hanging(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Hang)
    }

    pub fn echo(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Echo)
    }

    pub fn delayed(name: &str, delay: Duration, output: &str) -> Self {
        Self::with_behavior(
            name,
            Behavior::Delay {
                delay,
                output: output.to_string(),
            },
        )
    }

    pub fn shared(self) -> Arc<dyn AgentCapability> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Time elapsed between consecutive calls.
    pub fn call_gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().map(|v| v.clone()).unwrap_or_default();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl AgentCapability for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &str) -> Result<String, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.to_string());
        }
        if let Ok(mut times) = self.call_times.lock() {
            times.push(Instant::now());
        }

        match &self.behavior {
            Behavior::FailThenOk {
                failures,
                kind,
                output,
            } => {
                if call < *failures {
                    Err(AgentError::new(*kind, format!("{} attempt {} failed", self.name, call + 1)))
                } else {
                    Ok(output.clone())
                }
            }
            Behavior::AlwaysFail { kind, detail } => Err(AgentError::new(*kind, detail.clone())),
            Behavior::Hang => future::pending().await,
            Behavior::Echo => Ok(format!("{}({})", self.name, input)),
            Behavior::Delay { delay, output } => {
                tokio::time::sleep(*delay).await;
                Ok(output.clone())
            }
        }
    }
}
