pub mod advent;
pub mod python;
pub mod reviewer;
pub mod schema;

pub use advent::{AdventClient, PuzzleDescriptionTool, PuzzleInputTool, SubmitAnswerTool};
pub use python::PythonTool;
pub use reviewer::ReviewerTool;
pub use schema::{InputSchema, ParamType, SchemaViolation};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sdk::{Arguments, CapabilityInput, EngineError, ErrorKind};
use tracing::{debug, warn};

use crate::llm::CapabilityDefinition;

/// A named action the backend can invoke.
///
/// Handlers report expected failures ("incorrect answer", "timed out") as
/// `Ok` text so the backend can react to them. `Err` is reserved for faults in
/// the handler itself and aborts the run.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable description surfaced to the backend
    fn description(&self) -> &str;

    fn input_schema(&self) -> InputSchema;

    async fn invoke(&self, input: CapabilityInput) -> anyhow::Result<String>;
}

/// A registered capability, frozen at registration time
#[derive(Clone)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
    handler: Arc<dyn Capability>,
}

impl std::fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Errors from looking up or executing a capability
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("Invalid arguments for '{capability}': {violation}")]
    InvalidArguments {
        capability: String,
        violation: SchemaViolation,
    },

    #[error("Capability '{capability}' failed: {source:#}")]
    HandlerFailure {
        capability: String,
        source: anyhow::Error,
    },
}

impl CapabilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCapability(_) => ErrorKind::UnknownCapability,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            Self::HandlerFailure { .. } => ErrorKind::HandlerFailure,
        }
    }
}

/// Registry of capabilities available to one or more runs.
///
/// Built once during setup and shared read-only (`Arc<CapabilityRegistry>`)
/// afterwards. Catalog order is registration order.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilityDescriptor>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// Create an empty registry with no capabilities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a capability. Names must be unique.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), EngineError> {
        let name = capability.name().to_string();
        if self.index.contains_key(&name) {
            return Err(EngineError::DuplicateCapability(name));
        }

        debug!("Registering capability '{}'", name);
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(CapabilityDescriptor {
            description: capability.description().to_string(),
            input_schema: capability.input_schema(),
            name,
            handler: capability,
        });
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, capability: Arc<dyn Capability>) -> Result<Self, EngineError> {
        self.register(capability)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Result<&CapabilityDescriptor, CapabilityError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of all registered capabilities, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Backend-facing catalog of every registered capability
    pub fn describe_all(&self) -> Vec<CapabilityDefinition> {
        self.entries
            .iter()
            .map(|e| CapabilityDefinition {
                name: e.name.clone(),
                description: e.description.clone(),
                parameters: e.input_schema.to_json(),
            })
            .collect()
    }

    /// Validate arguments against the schema, then invoke the handler.
    pub async fn execute(
        &self,
        name: &str,
        arguments: &Arguments,
    ) -> Result<String, CapabilityError> {
        let descriptor = self.lookup(name)?;

        if let Err(violation) = descriptor.input_schema.validate(arguments) {
            warn!("Rejected arguments for '{}': {}", name, violation);
            return Err(CapabilityError::InvalidArguments {
                capability: name.to_string(),
                violation,
            });
        }

        debug!("Executing capability '{}'", name);
        descriptor
            .handler
            .invoke(CapabilityInput::new(arguments.clone()))
            .await
            .map_err(|source| CapabilityError::HandlerFailure {
                capability: name.to_string(),
                source,
            })
    }
}
