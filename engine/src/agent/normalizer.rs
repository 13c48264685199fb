//! Response Normalizer
//!
//! Classifies a [`RawCompletion`] into exactly one [`Intent`]:
//!
//! 1. Any structured invocation present: `CapabilityRequest` built from the
//!    first one. Later invocations are ignored.
//! 2. Trimmed text starting with [`TERMINAL_MARKER`]: `FinalAnswer`.
//! 3. Anything else: `Message`.
//!
//! Pure function of its input.

use sdk::Arguments;
use serde_json::Value;

use crate::llm::{RawCompletion, RawToolCall};

/// Literal prefix marking a final answer
pub const TERMINAL_MARKER: &str = "FINAL";

/// Capability invocation requested by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityRequest {
    pub name: String,
    pub arguments: Arguments,

    /// Free text accompanying the invocation, possibly empty
    pub raw_text: String,
}

/// Classified backend response
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CapabilityRequest(CapabilityRequest),
    FinalAnswer { content: String },
    Message { content: String },
}

impl Intent {
    /// Serialize back into a raw completion that classifies to the same intent
    pub fn to_raw(&self) -> RawCompletion {
        match self {
            Intent::CapabilityRequest(req) => RawCompletion {
                content: Some(req.raw_text.clone()),
                tool_calls: vec![RawToolCall::new(
                    req.name.clone(),
                    Value::Object(req.arguments.clone()),
                )],
            },
            Intent::FinalAnswer { content } => {
                RawCompletion::text(format!("{} {}", TERMINAL_MARKER, content))
            }
            Intent::Message { content } => RawCompletion::text(content.clone()),
        }
    }
}

/// Classification failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed arguments for '{name}': {detail}")]
    MalformedArguments {
        name: String,
        raw_text: String,
        detail: String,
    },
}

/// Classify a raw completion
pub fn normalize(raw: &RawCompletion) -> Result<Intent, NormalizeError> {
    let text = raw.content.as_deref().unwrap_or_default();

    if let Some(call) = raw.tool_calls.first() {
        let arguments =
            decode_arguments(&call.arguments).map_err(|detail| NormalizeError::MalformedArguments {
                name: call.name.clone(),
                raw_text: text.to_string(),
                detail,
            })?;

        return Ok(Intent::CapabilityRequest(CapabilityRequest {
            name: call.name.clone(),
            arguments,
            raw_text: text.to_string(),
        }));
    }

    if let Some(rest) = text.trim().strip_prefix(TERMINAL_MARKER) {
        return Ok(Intent::FinalAnswer {
            content: rest.trim().to_string(),
        });
    }

    Ok(Intent::Message {
        content: text.to_string(),
    })
}

/// Accept a JSON object as-is or JSON text encoding an object
pub fn decode_arguments(payload: &Value) -> Result<Arguments, String> {
    match payload {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(format!("expected a JSON object, got {}", other)),
            Err(e) => Err(format!("invalid JSON: {}", e)),
        },
        other => Err(format!("unsupported argument payload: {}", other)),
    }
}
