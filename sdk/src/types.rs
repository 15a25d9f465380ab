//! Diagnosis data model and tool input/output types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Plant categories the classifier supports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Plant {
    /// Potato plant
    Potato,

    /// Tomato plant
    Tomato,

    /// Pepper plant
    Pepper,
}

impl Plant {
    /// All supported plant categories.
    pub const ALL: [Plant; 3] = [Plant::Potato, Plant::Tomato, Plant::Pepper];
}

impl fmt::Display for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plant::Potato => write!(f, "potato"),
            Plant::Tomato => write!(f, "tomato"),
            Plant::Pepper => write!(f, "pepper"),
        }
    }
}

impl FromStr for Plant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "potato" => Ok(Plant::Potato),
            "tomato" => Ok(Plant::Tomato),
            "pepper" => Ok(Plant::Pepper),
            other => Err(format!(
                "invalid plant type '{}'. Use potato/tomato/pepper",
                other
            )),
        }
    }
}

/// A diagnosis request: image bytes plus the declared plant category.
///
/// Immutable once created; the orchestrator never mutates a request.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisRequest {
    /// Raw image bytes (jpeg/png)
    pub image: Vec<u8>,

    /// Declared plant category
    pub plant: Plant,
}

impl DiagnosisRequest {
    /// Create a new diagnosis request
    pub fn new(image: Vec<u8>, plant: Plant) -> Self {
        Self { image, plant }
    }
}

/// Result of disease classification for one request.
///
/// Produced once per request by the classifier adapter and never
/// mutated afterwards. There is no fallback for classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    /// Disease label from the classifier's label space
    pub label: String,

    /// Confidence score in [0, 1]
    pub confidence: f32,
}

/// Where an explanation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    /// Produced by the explanation service
    Generated,

    /// Produced by the fallback knowledge store (or the generic
    /// degraded-service text)
    Fallback,
}

/// Structured explanation of a diagnosed disease.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplanationResult {
    /// Short overview of the disease
    pub overview: String,

    /// Visible symptoms
    pub symptoms: String,

    /// Causes of the disease
    pub causes: String,

    /// Recommended treatment
    pub treatment: String,

    /// Prevention tips
    pub prevention: String,

    /// Which service produced this explanation
    pub source: ExplanationSource,
}

/// Reference to a synthesized audio artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioResult {
    /// URL or path of the audio artifact
    pub url: String,

    /// Audio container format (e.g. "mp3")
    pub format: String,

    /// Duration in seconds, when the synthesizer reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// General information about a plant, independent of disease state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantInfo {
    /// What the plant is and its agricultural importance
    pub description: String,

    /// Usage and nutrition notes
    pub usage: String,

    /// Cultivation brief
    pub cultivation: String,
}

/// Status of one tool invocation within a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The tool produced a payload
    Success,

    /// The tool failed after the retry policy was exhausted
    Failed,

    /// The tool was never invoked (e.g. nothing to explain)
    Skipped,
}

/// Typed union of the capability outputs a tool can produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolPayload {
    /// Output of the classification tool
    Classification(ClassificationResult),

    /// Output of the explanation tool (or a fallback substitution)
    Explanation(ExplanationResult),

    /// Output of the speech synthesis tool
    Audio(AudioResult),

    /// Output of the plant-info tool
    PlantInfo(PlantInfo),
}

/// Outcome of one tool invocation. Transient: exists only for the
/// duration of one request, consumed by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationOutcome {
    /// Tool name as registered in the dispatcher
    pub tool: String,

    /// Final status after the retry policy ran
    pub status: ToolStatus,

    /// Payload on success (or fallback substitution)
    pub payload: Option<ToolPayload>,

    /// Error description on failure
    pub error: Option<String>,
}

impl ToolInvocationOutcome {
    /// Record a successful invocation
    pub fn success(tool: impl Into<String>, payload: ToolPayload) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Success,
            payload: Some(payload),
            error: None,
        }
    }

    /// Record a failed invocation
    pub fn failed(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Failed,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Record a tool that was never invoked
    pub fn skipped(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            status: ToolStatus::Skipped,
            payload: None,
            error: None,
        }
    }
}

/// The aggregate response returned to the caller.
///
/// Always well-formed once classification succeeded: partial success is
/// represented through the per-field degradation flags, never by
/// aborting the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisResponse {
    /// Declared plant category from the request
    pub plant: Plant,

    /// Classification result (never fabricated)
    pub classification: ClassificationResult,

    /// Explanation, always populated once classification succeeded
    pub explanation: ExplanationResult,

    /// True when the explanation came from fallback or the generic
    /// degraded-service text
    pub explanation_degraded: bool,

    /// Audio artifact, absent when synthesis failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioResult>,

    /// True when audio is absent
    pub audio_degraded: bool,

    /// Plant information, absent when the plant-info path failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_info: Option<PlantInfo>,

    /// True when plant information is absent
    pub plant_info_degraded: bool,
}

/// Input to a tool invocation at the dispatcher boundary.
///
/// Dynamic, loosely-typed payloads travel as a JSON params map and are
/// schema-validated by the dispatcher before any adapter is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub params: HashMap<String, serde_json::Value>,
}

impl ToolInput {
    /// Create an empty ToolInput
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

impl Default for ToolInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_from_str_case_insensitive() {
        assert_eq!("Potato".parse::<Plant>().unwrap(), Plant::Potato);
        assert_eq!("TOMATO".parse::<Plant>().unwrap(), Plant::Tomato);
        assert_eq!(" pepper ".parse::<Plant>().unwrap(), Plant::Pepper);
        assert!("cucumber".parse::<Plant>().is_err());
    }

    #[test]
    fn test_plant_display_roundtrip() {
        for plant in Plant::ALL {
            assert_eq!(plant.to_string().parse::<Plant>().unwrap(), plant);
        }
    }

    #[test]
    fn test_explanation_source_serialization() {
        let json = serde_json::to_string(&ExplanationSource::Generated).unwrap();
        assert_eq!(json, r#""generated""#);
        let json = serde_json::to_string(&ExplanationSource::Fallback).unwrap();
        assert_eq!(json, r#""fallback""#);
    }

    #[test]
    fn test_tool_input_params() {
        let input = ToolInput::new()
            .with_param("plant", serde_json::json!("potato"))
            .with_param("confidence", serde_json::json!(0.92));

        assert_eq!(input.param_str("plant"), Some("potato"));
        // Non-string values are present but not readable as strings.
        assert_eq!(input.param_str("confidence"), None);
        assert_eq!(input.param_str("missing"), None);
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = ToolInvocationOutcome::success(
            "classify_leaf",
            ToolPayload::Classification(ClassificationResult {
                label: "Healthy".to_string(),
                confidence: 0.99,
            }),
        );
        assert_eq!(ok.status, ToolStatus::Success);
        assert!(ok.error.is_none());

        let failed = ToolInvocationOutcome::failed("explain_disease", "timed out");
        assert_eq!(failed.status, ToolStatus::Failed);
        assert!(failed.payload.is_none());

        let skipped = ToolInvocationOutcome::skipped("synthesize_speech");
        assert_eq!(skipped.status, ToolStatus::Skipped);
    }

    #[test]
    fn test_diagnosis_response_serialization_omits_absent_fields() {
        let response = DiagnosisResponse {
            plant: Plant::Potato,
            classification: ClassificationResult {
                label: "Early Blight".to_string(),
                confidence: 0.92,
            },
            explanation: ExplanationResult {
                overview: "o".to_string(),
                symptoms: "s".to_string(),
                causes: "c".to_string(),
                treatment: "t".to_string(),
                prevention: "p".to_string(),
                source: ExplanationSource::Fallback,
            },
            explanation_degraded: true,
            audio: None,
            audio_degraded: true,
            plant_info: None,
            plant_info_degraded: true,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains(r#""audio":"#));
        assert!(json.contains(r#""source":"fallback""#));
    }
}
