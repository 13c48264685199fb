//! Agent Core
//!
//! This module implements the step-bounded control loop. Each step:
//!
//! 1. Build the capability catalog and send it with the full transcript to the backend
//! 2. Classify the response (capability request, final answer or message)
//! 3. Capability request: check the name, execute, append the raw text, the call
//!    and its result, record a history entry
//! 4. Final answer: return it
//! 5. Message: append it
//!
//! The run ends with the final answer, or with [`BUDGET_EXHAUSTED`] once the
//! step limit is spent. Unknown capabilities, backend failures and handler
//! faults abort the run. Malformed or invalid arguments are written into the
//! transcript as the observation so the backend can correct itself.

use std::sync::Arc;

use sdk::errors::{EngineError, ErrorKind};
use sdk::{Arguments, CapabilityCall};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::normalizer::{self, Intent, NormalizeError};
use super::transcript::Transcript;
use crate::llm::BackendClient;
use crate::prompts;
use crate::tools::{CapabilityError, CapabilityRegistry};

/// Default number of backend calls per run
pub const DEFAULT_STEP_LIMIT: usize = 20;

/// Result text when the step budget runs out
pub const BUDGET_EXHAUSTED: &str = "Stopped: max steps reached.";

/// Per-agent settings
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_preamble: String,
    pub step_limit: usize,
}

impl AgentConfig {
    pub fn new(system_preamble: impl Into<String>) -> Self {
        Self {
            system_preamble: system_preamble.into(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }
}

/// How a run terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The backend produced a final answer
    Final(String),

    /// The step limit was reached first
    BudgetExhausted,
}

impl RunOutcome {
    /// The text returned to the caller
    pub fn text(&self) -> &str {
        match self {
            RunOutcome::Final(content) => content,
            RunOutcome::BudgetExhausted => BUDGET_EXHAUSTED,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RunOutcome::Final(content) => content,
            RunOutcome::BudgetExhausted => BUDGET_EXHAUSTED.to_string(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, RunOutcome::Final(_))
    }
}

/// One executed capability, kept for inspection after the run
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub step: usize,
    pub capability: String,
    pub arguments: Arguments,
    pub observation: String,
}

/// Everything a finished run leaves behind
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,

    /// Number of backend calls made
    pub steps: usize,
    pub history: Vec<HistoryEntry>,
    pub transcript: Transcript,
}

/// State owned by a single `run` call
struct RunState {
    step_count: usize,
    transcript: Transcript,
    history: Vec<HistoryEntry>,
}

impl RunState {
    fn new(config: &AgentConfig, goal: &str) -> Self {
        Self {
            step_count: 0,
            transcript: Transcript::seeded(&config.system_preamble, &prompts::goal_turn(goal)),
            history: Vec::new(),
        }
    }

    /// Append raw text, call and result turns for one executed step.
    fn record_capability(
        &mut self,
        step: usize,
        raw_text: String,
        name: String,
        arguments: Arguments,
        observation: String,
    ) -> Result<(), EngineError> {
        let correlation_id = format!("call_{}", step);

        let call = CapabilityCall::new(correlation_id, &name, arguments.clone());
        self.transcript
            .push_capability_exchange(raw_text, call, observation.clone())
            .map_err(|e| EngineError::Transcript(e.to_string()))?;

        self.history.push(HistoryEntry {
            step,
            capability: name,
            arguments,
            observation,
        });
        Ok(())
    }

    fn finish(self, run_id: Uuid, outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id,
            outcome,
            steps: self.step_count,
            history: self.history,
            transcript: self.transcript,
        }
    }
}

/// Step-bounded control loop over one backend and one capability registry
pub struct Orchestrator {
    config: AgentConfig,
    backend: Arc<dyn BackendClient>,
    registry: Arc<CapabilityRegistry>,
}

impl Orchestrator {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn BackendClient>,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            config,
            backend,
            registry,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Run the loop for a goal and return the final text or the budget sentinel
    pub async fn run(&self, goal: &str) -> Result<String, EngineError> {
        Ok(self.run_with_report(goal).await?.outcome.into_text())
    }

    /// Run the loop for a goal, keeping the transcript and history
    pub async fn run_with_report(&self, goal: &str) -> Result<RunReport, EngineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, backend = self.backend.name());
        self.drive(run_id, goal).instrument(span).await
    }

    async fn drive(&self, run_id: Uuid, goal: &str) -> Result<RunReport, EngineError> {
        info!(
            "Starting run: {} ({} capabilities, limit {} steps)",
            goal,
            self.registry.len(),
            self.config.step_limit
        );

        let mut state = RunState::new(&self.config, goal);

        for step in 0..self.config.step_limit {
            debug!("Step {}/{}", step + 1, self.config.step_limit);

            let catalog = self.registry.describe_all();
            state.step_count += 1;
            let raw = self
                .backend
                .complete(state.transcript.turns(), &catalog)
                .await
                .map_err(|e| {
                    error!("Backend call failed at step {}: {}", step, e);
                    EngineError::BackendTransport(e.to_string())
                })?;

            if raw.tool_calls.len() > 1 {
                debug!(
                    "Dropping {} extra capability invocations at step {}",
                    raw.tool_calls.len() - 1,
                    step
                );
            }

            match normalizer::normalize(&raw) {
                Ok(Intent::CapabilityRequest(request)) => {
                    self.ensure_registered(&request.name)?;
                    info!("Step {}: calling {} with {:?}", step, request.name, request.arguments);

                    let observation = self.execute(&request.name, &request.arguments).await?;
                    state.record_capability(
                        step,
                        request.raw_text,
                        request.name,
                        request.arguments,
                        observation,
                    )?;
                }
                Err(err @ NormalizeError::MalformedArguments { .. }) => {
                    let NormalizeError::MalformedArguments { name, raw_text, .. } = err.clone();
                    self.ensure_registered(&name)?;
                    warn!("Step {}: {}", step, err);

                    let observation = folded_observation(ErrorKind::MalformedArguments, &err);
                    state.record_capability(step, raw_text, name, Arguments::new(), observation)?;
                }
                Ok(Intent::FinalAnswer { content }) => {
                    info!("Step {}: final answer received: {}", step, content);
                    return Ok(state.finish(run_id, RunOutcome::Final(content)));
                }
                Ok(Intent::Message { content }) => {
                    debug!("Step {}: assistant message: {}", step, content);
                    state.transcript.push_assistant(content);
                }
            }
        }

        warn!("Run exhausted its budget of {} steps", self.config.step_limit);
        Ok(state.finish(run_id, RunOutcome::BudgetExhausted))
    }

    fn ensure_registered(&self, name: &str) -> Result<(), EngineError> {
        if self.registry.contains(name) {
            return Ok(());
        }
        error!(
            "Unknown capability '{}'. Registered: {}",
            name,
            self.registry.names().join(", ")
        );
        Err(EngineError::UnknownCapability(name.to_string()))
    }

    /// Execute a capability, folding argument errors into the observation
    async fn execute(&self, name: &str, arguments: &Arguments) -> Result<String, EngineError> {
        match self.registry.execute(name, arguments).await {
            Ok(observation) => Ok(observation),
            Err(err @ CapabilityError::InvalidArguments { .. }) => {
                Ok(folded_observation(err.kind(), &err))
            }
            Err(CapabilityError::UnknownCapability(name)) => {
                Err(EngineError::UnknownCapability(name))
            }
            Err(CapabilityError::HandlerFailure { capability, source }) => {
                error!("Capability '{}' faulted: {:#}", capability, source);
                Err(EngineError::HandlerFailure {
                    capability,
                    message: format!("{:#}", source),
                })
            }
        }
    }
}

fn folded_observation(kind: ErrorKind, err: &dyn std::fmt::Display) -> String {
    format!("Error ({}): {}", kind, err)
}
