//! Error types and handling
//!
//! This module provides the error types used throughout the LeafScan
//! engine. All errors implement the `LeafErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! # Taxonomy
//!
//! - `InvalidInput`: caller error at the dispatcher boundary; never
//!   retried.
//! - `Unreachable` / `Timeout`: transient infrastructure faults;
//!   retried once by the orchestrator, then degraded or failed.
//! - `InvalidResponse`: an adapter returned unparseable or
//!   out-of-schema data; retried once, then degraded.
//! - `RequestFailure`: classification could not be obtained after the
//!   retry; surfaced to the caller as an explicit failure, never as a
//!   degraded response.

use thiserror::Error;

/// Trait for LeafScan error extensions
///
/// Provides additional context for errors: a user-friendly hint safe to
/// display to end users, and whether the error is worth retrying.
pub trait LeafErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors indicate a caller bug or a hard request failure.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// Represents all failures the engine can surface to its caller. Adapter
/// and dispatcher internals use their own local enums; this is the
/// boundary type.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Dispatcher errors
    #[error("Invalid input for tool '{tool}': {reason}")]
    InvalidInput { tool: String, reason: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    // Transient service faults
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Service call timed out: {0}")]
    Timeout(String),

    #[error("Invalid response from {service}: {detail}")]
    InvalidResponse { service: String, detail: String },

    // Request-level failure: classification could not be obtained
    #[error("Diagnosis request failed: {0}")]
    RequestFailure(String),
}

impl LeafErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            EngineError::Config(_) => {
                "Check ~/.leafscan/config.toml for missing or malformed settings."
            }
            EngineError::InvalidInput { .. } => {
                "The tool input did not match its schema. This is a caller bug, not a service fault."
            }
            EngineError::ToolNotFound(_) => "No tool with that name is registered.",
            EngineError::Unreachable(_) => {
                "A backend service could not be reached. Check that it is running and retry."
            }
            EngineError::Timeout(_) => "A backend service did not respond in time. Retry shortly.",
            EngineError::InvalidResponse { .. } => {
                "A backend service returned data the engine could not parse."
            }
            EngineError::RequestFailure(_) => {
                "The leaf image could not be classified. Try a clearer image or retry later."
            }
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            EngineError::Config(_) => false,
            EngineError::InvalidInput { .. } => false,
            EngineError::ToolNotFound(_) => false,
            EngineError::Unreachable(_) => true,
            EngineError::Timeout(_) => true,
            EngineError::InvalidResponse { .. } => true,
            EngineError::RequestFailure(_) => true,
        }
    }
}
