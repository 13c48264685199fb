//! Error types and handling
//!
//! This module provides the error taxonomy shared by the Stride engine and
//! capability implementations. Every engine error maps onto one of a small,
//! closed set of [`ErrorKind`]s which decide how the control loop reacts:
//!
//! - **Folded**: `MalformedArguments`, `InvalidArguments`. The error text becomes
//!   the capability observation and the run continues so the backend can
//!   self-correct.
//! - **Fatal**: `UnknownCapability`, `BackendTransportFailure`, `HandlerFailure`.
//!   The run aborts and the error is surfaced to the caller.

use std::fmt;

use thiserror::Error;

/// Trait for Stride error extensions
///
/// Provides user-facing context for errors: a short hint and whether the
/// control loop can keep going after the error.
pub trait StrideErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recovered inside a run
    ///
    /// Recoverable errors are folded into the transcript as observations.
    /// Non-recoverable errors abort the run.
    fn is_recoverable(&self) -> bool;

    /// Returns the taxonomy bucket of the error, if it has one
    fn kind(&self) -> Option<ErrorKind>;
}

/// Closed taxonomy of failures the control loop distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend's invocation payload could not be decoded into arguments
    MalformedArguments,

    /// Arguments failed the capability's input schema
    InvalidArguments,

    /// The requested capability is not registered
    UnknownCapability,

    /// The backend client could not obtain a response
    BackendTransportFailure,

    /// A capability handler faulted internally
    HandlerFailure,
}

impl ErrorKind {
    /// Whether errors of this kind are folded into the transcript
    pub fn is_folded(self) -> bool {
        matches!(self, Self::MalformedArguments | Self::InvalidArguments)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedArguments => "MalformedArguments",
            Self::InvalidArguments => "InvalidArguments",
            Self::UnknownCapability => "UnknownCapability",
            Self::BackendTransportFailure => "BackendTransportFailure",
            Self::HandlerFailure => "HandlerFailure",
        };
        f.write_str(name)
    }
}

/// Main engine error type
///
/// Errors that can abort a run or the process. Folded errors
/// (`MalformedArguments`, `InvalidArguments`) never show up here because the
/// loop turns them into observation text.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorKind, StrideErrorExt};
///
/// let error = EngineError::UnknownCapability("frobnicate".to_string());
/// assert_eq!(error.kind(), Some(ErrorKind::UnknownCapability));
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Registry setup errors
    #[error("Capability registered twice: {0}")]
    DuplicateCapability(String),

    // Agent loop errors
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Backend transport failure: {0}")]
    BackendTransport(String),

    #[error("Capability '{capability}' failed: {message}")]
    HandlerFailure { capability: String, message: String },

    #[error("Transcript invariant violated: {0}")]
    Transcript(String),
}

impl StrideErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::DuplicateCapability(_) => "Each capability name may only be registered once",
            Self::UnknownCapability(_) => {
                "The model asked for an unregistered capability. Check the prompt and registry"
            }
            Self::BackendTransport(_) => "Backend unavailable. Check your API key and network",
            Self::HandlerFailure { .. } => "A capability crashed. Check the logs for details",
            Self::Transcript(_) => "Internal error while recording the conversation",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::UnknownCapability(_) => Some(ErrorKind::UnknownCapability),
            Self::BackendTransport(_) => Some(ErrorKind::BackendTransportFailure),
            Self::HandlerFailure { .. } => Some(ErrorKind::HandlerFailure),
            Self::Config(_) | Self::DuplicateCapability(_) | Self::Transcript(_) => None,
        }
    }
}
