//! Stride Engine Library
//!
//! This library provides the step-bounded agent loop and its capabilities.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// LLM backend abstraction layer
pub mod llm;

/// Agent loop core module
pub mod agent;

/// Built-in capabilities
pub mod tools;

/// System preambles and goal templates
pub mod prompts;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
