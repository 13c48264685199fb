//! Transcript for the Agent Loop
//!
//! Ordered, append-only record of a run's turns (system preamble, user goal,
//! assistant text, capability calls and their results). The full transcript is
//! replayed to the backend on every step, so nothing is ever trimmed, reordered
//! or rewritten. Turns are only reachable through shared references.

use sdk::CapabilityCall;

use crate::llm::{Turn, TurnRole};

/// Violations of the call/result pairing invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("correlation id '{0}' is already used by an earlier call")]
    DuplicateCall(String),

    #[error("no capability call with correlation id '{0}'")]
    UnmatchedResult(String),

    #[error("correlation id '{0}' already has a result")]
    DuplicateResult(String),
}

/// Append-only sequence of turns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript opened with a system preamble and a user goal
    pub fn seeded(system_preamble: &str, user_goal: &str) -> Self {
        let mut transcript = Self::new();
        transcript.push_system(system_preamble);
        transcript.push_user(user_goal);
        transcript
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::system(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Record an assistant turn carrying a capability call.
    pub fn push_capability_call(&mut self, call: CapabilityCall) -> Result<(), TranscriptError> {
        if self.call_index(&call.id).is_some() {
            return Err(TranscriptError::DuplicateCall(call.id));
        }
        self.turns.push(Turn::capability_call(call));
        Ok(())
    }

    /// Record the result of an earlier call. Each call gets exactly one result.
    pub fn push_capability_result(
        &mut self,
        capability_name: impl Into<String>,
        correlation_id: &str,
        content: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        if self.call_index(correlation_id).is_none() {
            return Err(TranscriptError::UnmatchedResult(correlation_id.to_string()));
        }
        if self.result_for(correlation_id).is_some() {
            return Err(TranscriptError::DuplicateResult(correlation_id.to_string()));
        }
        self.turns.push(Turn::capability_result(
            capability_name,
            correlation_id,
            content,
        ));
        Ok(())
    }

    /// Record one executed step: the raw assistant text, the call and its
    /// result. Nothing is appended unless the call id is unused.
    pub fn push_capability_exchange(
        &mut self,
        raw_text: impl Into<String>,
        call: CapabilityCall,
        content: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        if self.call_index(&call.id).is_some() {
            return Err(TranscriptError::DuplicateCall(call.id));
        }

        let result = Turn::capability_result(call.name.clone(), call.id.clone(), content);
        self.turns.push(Turn::assistant(raw_text));
        self.turns.push(Turn::capability_call(call));
        self.turns.push(result);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Result turn paired with a correlation id
    pub fn result_for(&self, correlation_id: &str) -> Option<&Turn> {
        self.turns.iter().find(|t| {
            t.role == TurnRole::CapabilityResult
                && t.correlation_id.as_deref() == Some(correlation_id)
        })
    }

    fn call_index(&self, correlation_id: &str) -> Option<usize> {
        self.turns.iter().position(|t| {
            t.capability_call
                .as_ref()
                .is_some_and(|call| call.id == correlation_id)
        })
    }
}
