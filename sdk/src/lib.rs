//! LeafScan SDK
//!
//! Shared library providing the data model and error types used by the
//! LeafScan orchestration engine. This crate defines the contracts that
//! cross component boundaries: the diagnosis data model, the tool
//! input/output envelope used at the dispatcher boundary, and the
//! engine-wide error taxonomy.

/// Error types and handling
pub mod errors;

/// Diagnosis data model and tool input/output types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, LeafErrorExt};
pub use types::{
    AudioResult, ClassificationResult, DiagnosisRequest, DiagnosisResponse, ExplanationResult,
    ExplanationSource, Plant, PlantInfo, ToolInput, ToolInvocationOutcome, ToolPayload, ToolStatus,
};
