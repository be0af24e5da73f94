//! Orchestrator: runs the agent chain step by step.
//!
//! For every request the orchestrator:
//! 1. Emits a `started` event for the current agent
//! 2. Invokes the agent through the retry governor and the step timeout guard
//! 3. On success emits `completed` (with an output preview) and feeds the
//!    output to the next agent
//! 4. On failure emits a single `failed` event and stops the run
//! 5. After the last agent, emits the final result
//!
//! Events are pushed into a bounded channel drained by the transport. When
//! the receiving side goes away the in-flight step is cancelled and the run
//! is abandoned.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::agents::{AgentCapability, AgentError, FailureKind};
use crate::error::ConfigError;
use crate::events::{FinalResult, ProgressEvent, WorkflowMessage};
use crate::metrics::MetricsSink;
use crate::workflow::retry::RetryPolicy;
use crate::workflow::schema::validate_names;
use crate::workflow::state::{InvalidTransition, Transition, WorkflowState};
use crate::workflow::timeout::{TimeoutGuard, DEFAULT_STEP_TIMEOUT};

/// Default capacity of the per-run event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 16;

/// Lazily consumed event stream of one run.
pub type WorkflowStream = ReceiverStream<WorkflowMessage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub step_timeout: Duration,
    pub retry: RetryPolicy,
    pub event_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            retry: RetryPolicy::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// The chain engine. Cheap to clone; all clones share the same immutable
/// agent sequence and metrics sink.
#[derive(Clone)]
pub struct Orchestrator {
    agents: Arc<[Arc<dyn AgentCapability>]>,
    metrics: Arc<dyn MetricsSink>,
    retry: RetryPolicy,
    guard: TimeoutGuard,
    event_buffer: usize,
}

impl Orchestrator {
    pub fn new(
        agents: Vec<Arc<dyn AgentCapability>>,
        config: OrchestratorConfig,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, ConfigError> {
        validate_names(agents.iter().map(|a| a.name()))?;

        Ok(Self {
            agents: agents.into(),
            metrics,
            retry: config.retry,
            guard: TimeoutGuard::new(config.step_timeout),
            event_buffer: config.event_buffer.max(1),
        })
    }

    pub fn total_steps(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Agent names joined as `"A -> B -> C"`.
    pub fn workflow_name(&self) -> String {
        self.agent_names().join(" -> ")
    }

    pub fn step_timeout(&self) -> Duration {
        self.guard.limit()
    }

    /// Start a run on the current tokio runtime and return its event stream.
    ///
    /// Dropping the stream cancels the run at its current step.
    pub fn execute(&self, query: impl Into<String>) -> WorkflowStream {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let this = self.clone();
        let query = query.into();
        tokio::spawn(async move {
            this.run(query, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Drive one run to completion, pushing every event into `tx`.
    ///
    /// Returns the state the run ended in. A run abandoned because the
    /// receiver was dropped ends in a non-terminal `RunningStep`.
    pub async fn run(&self, query: String, tx: mpsc::Sender<WorkflowMessage>) -> WorkflowState {
        let run_id = Uuid::new_v4();
        let mut state = WorkflowState::Idle;

        if let Err(e) = self.drive(run_id, query, &tx, &mut state).await {
            tracing::error!(%run_id, error = %e, "Workflow state machine rejected a transition");
        }
        state
    }

    async fn drive(
        &self,
        run_id: Uuid,
        query: String,
        tx: &mpsc::Sender<WorkflowMessage>,
        state: &mut WorkflowState,
    ) -> Result<(), InvalidTransition> {
        let start = Instant::now();
        let total = self.total_steps();
        self.metrics.record_request();

        tracing::info!(%run_id, total_steps = total, workflow = %self.workflow_name(), "Workflow started");

        *state = state.advance(Transition::Begin, total)?;
        let mut steps: Vec<ProgressEvent> = Vec::with_capacity(total);
        let mut current_input = query;

        for (i, agent) in self.agents.iter().enumerate() {
            let step_index = i + 1;
            let name = agent.name();

            if !emit(tx, ProgressEvent::started(name, step_index, total)).await {
                tracing::info!(%run_id, agent = %name, step = step_index, "Client disconnected, abandoning workflow");
                return Ok(());
            }
            tracing::info!(%run_id, agent = %name, step = step_index, "Step started");

            let outcome = tokio::select! {
                biased;
                _ = tx.closed() => {
                    tracing::info!(%run_id, agent = %name, step = step_index, "Client disconnected, cancelling step");
                    return Ok(());
                }
                result = self.invoke_step(agent.as_ref(), &current_input) => result,
            };

            match outcome {
                Ok(output) => {
                    let event = ProgressEvent::completed(name, step_index, total, &output);
                    steps.push(event.clone());
                    tracing::info!(
                        %run_id,
                        agent = %name,
                        step = step_index,
                        output_chars = output.chars().count(),
                        "Step completed"
                    );
                    if !emit(tx, event).await {
                        tracing::info!(%run_id, agent = %name, "Client disconnected, abandoning workflow");
                        return Ok(());
                    }
                    // The last step only succeeds once the final result is handed off.
                    if step_index < total {
                        *state = state.advance(Transition::StepSucceeded, total)?;
                    }
                    current_input = output;
                }
                Err(err) => {
                    self.metrics.record_step_error(name);
                    let transition = match err.kind {
                        FailureKind::Timeout => {
                            tracing::error!(%run_id, agent = %name, step = step_index, error = %err, "Agent timeout");
                            Transition::StepTimedOut
                        }
                        FailureKind::Transient | FailureKind::Fatal => {
                            tracing::error!(
                                %run_id,
                                agent = %name,
                                step = step_index,
                                kind = err.kind.as_str(),
                                error = %err,
                                "Agent execution error"
                            );
                            Transition::StepFailed
                        }
                    };
                    *state = state.advance(transition, total)?;
                    emit(tx, ProgressEvent::failed(name, step_index, total, err.to_string())).await;
                    return Ok(());
                }
            }
        }

        let final_result = FinalResult {
            workflow: self.workflow_name(),
            steps,
            final_output: Some(current_input),
        };
        if !emit(tx, final_result).await {
            tracing::info!(%run_id, "Client disconnected, abandoning workflow");
            return Ok(());
        }
        *state = state.advance(Transition::StepSucceeded, total)?;

        let elapsed = start.elapsed();
        self.metrics.observe_duration(elapsed);
        tracing::info!(
            %run_id,
            duration_ms = elapsed.as_millis() as u64,
            workflow = %self.workflow_name(),
            "Orchestration finished"
        );
        Ok(())
    }

    /// Retry governor wrapped around the timeout guard wrapped around the agent.
    async fn invoke_step(&self, agent: &dyn AgentCapability, input: &str) -> Result<String, AgentError> {
        self.retry
            .invoke(agent.name(), || self.guard.run(agent, input))
            .await
    }
}

/// Push one message; `false` once the receiver is gone.
async fn emit(tx: &mpsc::Sender<WorkflowMessage>, message: impl Into<WorkflowMessage>) -> bool {
    tx.send(message.into()).await.is_ok()
}
