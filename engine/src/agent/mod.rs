//! Agent Loop Core
//!
//! This module implements the step-bounded control loop: the response
//! normalizer that classifies backend output, the append-only transcript
//! replayed on every step, and the orchestrator tying them to a capability
//! registry.

pub mod core;
pub mod normalizer;
pub mod transcript;

pub use self::core::{
    AgentConfig, HistoryEntry, Orchestrator, RunOutcome, RunReport, BUDGET_EXHAUSTED,
    DEFAULT_STEP_LIMIT,
};
pub use normalizer::{normalize, CapabilityRequest, Intent, NormalizeError, TERMINAL_MARKER};
pub use transcript::{Transcript, TranscriptError};
