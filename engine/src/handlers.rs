//! Command handlers for CLI operations
//!
//! Wires the configured backend and capabilities into an orchestrator and
//! prints the run result on stdout, as plain text or JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

use crate::agent::{AgentConfig, Orchestrator, RunReport};
use crate::config::Config;
use crate::llm::openai::OpenAIBackend;
use crate::llm::BackendClient;
use crate::prompts;
use crate::tools::{
    AdventClient, CapabilityRegistry, PuzzleDescriptionTool, PuzzleInputTool, PythonTool,
    ReviewerTool, SubmitAnswerTool,
};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

fn python_tool(config: &Config) -> PythonTool {
    PythonTool::new(
        config.tools.python.clone(),
        Duration::from_secs(config.tools.python_timeout_secs),
    )
}

/// Registry used by the reviewer sub-agent: code execution only
pub fn build_reviewer_registry(config: &Config) -> Result<Arc<CapabilityRegistry>> {
    let registry = CapabilityRegistry::empty().with(Arc::new(python_tool(config)))?;
    Ok(Arc::new(registry))
}

/// Registry used by the solver agent
///
/// Holds the puzzle tools and the code runner, plus `run_reviewer` when
/// `review` is set.
pub fn build_solver_registry(
    config: &Config,
    backend: Arc<dyn BackendClient>,
    review: bool,
) -> Result<Arc<CapabilityRegistry>> {
    let advent = Arc::new(AdventClient::from_env(
        config.tools.advent_base_url.clone(),
        config.tools.default_year,
    ));

    let mut registry = CapabilityRegistry::empty()
        .with(Arc::new(PuzzleDescriptionTool::new(Arc::clone(&advent))))?
        .with(Arc::new(PuzzleInputTool::new(Arc::clone(&advent))))?
        .with(Arc::new(SubmitAnswerTool::new(advent)))?
        .with(Arc::new(python_tool(config)))?;

    if review {
        let reviewer_config = AgentConfig::new(prompts::REVIEWER_PREAMBLE)
            .with_step_limit(config.tools.reviewer_max_steps);
        registry.register(Arc::new(ReviewerTool::new(
            reviewer_config,
            backend,
            build_reviewer_registry(config)?,
        )))?;
    }

    Ok(Arc::new(registry))
}

/// Solver agent settings for the given review mode
pub fn solver_config(config: &Config, review: bool) -> AgentConfig {
    let preamble = if review {
        prompts::SOLVER_PREAMBLE
    } else {
        prompts::SOLVER_PREAMBLE_UNREVIEWED
    };
    AgentConfig::new(preamble).with_step_limit(config.core.max_steps)
}

/// Run the solver agent for a goal and print the result
///
/// Review is enabled when both the config and the caller allow it.
pub async fn handle_run(
    goal: String,
    config: &Config,
    format: OutputFormat,
    review: bool,
) -> Result<()> {
    let backend: Arc<dyn BackendClient> = Arc::new(
        OpenAIBackend::from_config(&config.llm).context("Failed to configure the LLM backend")?,
    );

    let review = review && config.tools.reviewer;
    let registry = build_solver_registry(config, Arc::clone(&backend), review)?;
    let orchestrator = Orchestrator::new(solver_config(config, review), backend, registry);

    let report = orchestrator
        .run_with_report(&goal)
        .await
        .context("Agent run failed")?;

    println!("{}", render_report(&report, format));
    Ok(())
}

/// Format a finished run for stdout
pub fn render_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => report.outcome.text().to_string(),
        OutputFormat::Json => {
            let outcome = if report.outcome.is_final() {
                "final"
            } else {
                "budget_exhausted"
            };
            json!({
                "run_id": report.run_id.to_string(),
                "outcome": outcome,
                "result": report.outcome.text(),
                "steps": report.steps,
            })
            .to_string()
        }
    }
}
