//! Capability argument and call types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Argument mapping passed to a capability
pub type Arguments = serde_json::Map<String, Value>;

/// A recorded capability invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityCall {
    /// Correlation id linking the call to its result
    pub id: String,

    /// Registered capability name
    pub name: String,

    /// Decoded arguments
    pub arguments: Arguments,
}

impl CapabilityCall {
    /// Create a new capability call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments rendered as compact JSON text
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Validated input handed to a capability handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityInput {
    pub params: Arguments,
}

impl CapabilityInput {
    /// Wrap an argument mapping
    pub fn new(params: Arguments) -> Self {
        Self { params }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Result<&str, ArgumentError> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))
    }

    /// Get an i64 parameter
    pub fn param_i64(&self, key: &str) -> Result<i64, ArgumentError> {
        self.params
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional i64 parameter
    pub fn param_i64_opt(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional bool parameter
    pub fn param_bool_opt(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(|v| v.as_bool())
    }
}

/// Argument access errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Missing parameter: {0}")]
    Missing(String),
}
