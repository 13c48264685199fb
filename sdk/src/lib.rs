//! Stride SDK
//!
//! Shared library providing the error taxonomy and argument types used by the
//! engine and by capability implementations.

/// Error types and handling
pub mod errors;

/// Capability argument and call types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ErrorKind, StrideErrorExt};
pub use types::{ArgumentError, Arguments, CapabilityCall, CapabilityInput};
