//! Backend Client Abstraction Layer
//!
//! This module defines the boundary between the control loop and a reasoning
//! backend. A [`BackendClient`] receives the full transcript plus the capability
//! catalog and returns a [`RawCompletion`]: free text and zero or more structured
//! capability invocations, with vendor-specific response shapes already peeled
//! away. Classifying that completion into an intent is the normalizer's job, not
//! the client's.

use async_trait::async_trait;
use sdk::CapabilityCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod openai;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while obtaining a completion
///
/// Every variant is fatal for the run; the control loop never retries.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Role of a transcript turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TurnRole {
    /// System preamble
    System,

    /// User goal
    User,

    /// Assistant text or capability call
    Assistant,

    /// Observation returned by a capability
    CapabilityResult,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::System => write!(f, "system"),
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
            TurnRole::CapabilityResult => write!(f, "capability-result"),
        }
    }
}

/// One immutable entry of a transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Role of the turn
    pub role: TurnRole,

    /// Text content, possibly empty
    pub content: String,

    /// Capability invocation recorded by an assistant turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_call: Option<CapabilityCall>,

    /// Capability that produced a result turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_name: Option<String>,

    /// Correlation id shared by a call turn and its result turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Turn {
    fn plain(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            capability_call: None,
            capability_name: None,
            correlation_id: None,
        }
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::System, content)
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::User, content)
    }

    /// Create an assistant text turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::Assistant, content)
    }

    /// Create an assistant turn recording a capability call
    pub fn capability_call(call: CapabilityCall) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: String::new(),
            correlation_id: Some(call.id.clone()),
            capability_call: Some(call),
            capability_name: None,
        }
    }

    /// Create a capability result turn
    pub fn capability_result(
        capability_name: impl Into<String>,
        correlation_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: TurnRole::CapabilityResult,
            content: content.into(),
            capability_call: None,
            capability_name: Some(capability_name.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }
}

/// Catalog entry describing one capability to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityDefinition {
    pub name: String,
    pub description: String,

    /// JSON-schema object describing the arguments
    pub parameters: Value,
}

/// Structured capability invocation as the backend sent it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawToolCall {
    /// Vendor-assigned id, if any. The loop assigns its own correlation ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Argument payload, either a JSON object or JSON text
    pub arguments: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }
}

/// Raw completion returned by a backend, before classification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCompletion {
    /// Free text, absent when the backend sent none
    #[serde(default)]
    pub content: Option<String>,

    /// Structured invocations, in backend order
    #[serde(default)]
    pub tool_calls: Vec<RawToolCall>,
}

impl RawCompletion {
    /// A completion carrying only text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A completion carrying one capability invocation
    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            content: None,
            tool_calls: vec![RawToolCall::new(name, arguments)],
        }
    }

    /// Attach accompanying free text
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Backend client trait all reasoning backends implement
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Short name for logs (e.g. "openai")
    fn name(&self) -> &str;

    /// Request one completion for the full transcript and capability catalog
    async fn complete(
        &self,
        turns: &[Turn],
        catalog: &[CapabilityDefinition],
    ) -> Result<RawCompletion>;
}
