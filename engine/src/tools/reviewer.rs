//! Reviewer Capability
//!
//! Runs a second, independent agent loop as a capability of the first. The
//! reviewer gets its own transcript and registry; the only data crossing
//! between the two agents is the text passed in as arguments and the text
//! returned as the observation.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sdk::CapabilityInput;
use tracing::info;

use super::{Capability, CapabilityRegistry, InputSchema, ParamType};
use crate::agent::{AgentConfig, Orchestrator};
use crate::llm::BackendClient;
use crate::prompts;

pub struct ReviewerTool {
    config: AgentConfig,
    backend: Arc<dyn BackendClient>,
    registry: Arc<CapabilityRegistry>,
}

impl ReviewerTool {
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
}

#[async_trait]
impl Capability for ReviewerTool {
    fn name(&self) -> &str {
        "run_reviewer"
    }

    fn description(&self) -> &str {
        "Ask a reviewer agent to check a solution. Returns 'Approved' or 'Rejected' with feedback."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::object()
            .required("description", ParamType::String)
            .describe("The puzzle description")
            .required("code", ParamType::String)
            .describe("The complete solution code")
    }

    async fn invoke(&self, input: CapabilityInput) -> Result<String> {
        let goal = prompts::review_goal(input.param_str("description")?, input.param_str("code")?);

        let reviewer = Orchestrator::new(
            self.config.clone(),
            Arc::clone(&self.backend),
            Arc::clone(&self.registry),
        );
        let report = reviewer.run_with_report(&goal).await?;
        info!(
            "Reviewer run {} finished after {} steps",
            report.run_id, report.steps
        );
        Ok(report.outcome.into_text())
    }
}
