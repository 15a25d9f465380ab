//! Capability Adapter Abstraction Layer
//!
//! This module provides the narrow contracts through which the engine
//! reaches its external collaborators: the disease classifier, the
//! explanation generator, the speech synthesizer, and the plant-info
//! service. Each adapter exposes a single typed `invoke`-style method
//! and fails with the closed `AdapterError` taxonomy rather than
//! propagating raw transport errors.
//!
//! No adapter retries internally; retry policy lives in the
//! orchestrator. Per-call timeouts are enforced by each adapter's HTTP
//! client and surface as `AdapterError::Timeout`.
//!
//! HTTP error mapping: connection failures map to `Unreachable`, client
//! timeouts to `Timeout`, 5xx statuses to `Unreachable` (the service is
//! failing), and any other non-success status or unparseable body to
//! `InvalidResponse`. Missing credentials also map to `Unreachable`:
//! from the engine's perspective the service cannot be reached.

use async_trait::async_trait;
use sdk::types::{AudioResult, ClassificationResult, ExplanationResult, Plant, PlantInfo};

pub mod classifier;
pub mod explainer;
pub mod plant_info;
pub mod synthesizer;

pub use classifier::HttpClassifier;
pub use explainer::ChatExplainer;
pub use plant_info::ChatPlantInfo;
pub use synthesizer::HttpSynthesizer;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Failure kinds an adapter may report.
///
/// This is a closed set: adapters translate every transport or parsing
/// problem into one of these three kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The service could not be reached (connection refused, DNS,
    /// missing credentials, 5xx)
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The per-call timeout elapsed
    #[error("service call timed out")]
    Timeout,

    /// The service answered, but the response did not parse into the
    /// expected schema
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    /// Translate a reqwest transport error into the adapter taxonomy.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else {
            AdapterError::Unreachable(err.to_string())
        }
    }

    /// Translate a non-success HTTP status into the adapter taxonomy.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.is_server_error() {
            AdapterError::Unreachable(format!("HTTP {}: {}", status.as_u16(), body))
        } else {
            AdapterError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), body))
        }
    }
}

/// Classifier service contract: `classify(image, plant) → {label, confidence}`.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a leaf image against the declared plant's label space.
    async fn classify(&self, image: &[u8], plant: Plant) -> Result<ClassificationResult>;
}

/// Explanation service contract:
/// `explain(plant, label) → {overview, symptoms, causes, treatment, prevention}`.
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Generate a structured explanation for a diagnosed disease.
    async fn explain(&self, plant: Plant, disease: &str) -> Result<ExplanationResult>;
}

/// Speech synthesis service contract: `synthesize(text) → audio artifact`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize speech for the given text and return the artifact
    /// reference.
    async fn synthesize(&self, text: &str) -> Result<AudioResult>;
}

/// Plant-info service contract:
/// `describe(plant) → {description, usage, cultivation}`.
#[async_trait]
pub trait PlantInfoProvider: Send + Sync {
    /// Fetch general information about a plant, independent of disease
    /// state.
    async fn describe(&self, plant: Plant) -> Result<PlantInfo>;
}

/// Recover a JSON object from loosely formatted model output.
///
/// Language models frequently wrap the requested JSON in markdown
/// fences or surround it with prose despite strict-JSON instructions.
/// Tries, in order:
/// 1. The whole trimmed content as JSON
/// 2. The body of the first markdown code fence
/// 3. A balanced `{...}` object found anywhere in the content
pub fn recover_json_object(content: &str) -> Option<&str> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed);
    }

    if let Some(inner) = extract_fenced_json(trimmed) {
        let inner = inner.trim();
        if serde_json::from_str::<serde_json::Value>(inner).is_ok() {
            return Some(inner);
        }
    }

    if let Some(pos) = trimmed.find('{') {
        if let Some(json_str) = extract_balanced_json(&trimmed[pos..]) {
            if serde_json::from_str::<serde_json::Value>(json_str).is_ok() {
                return Some(json_str);
            }
        }
    }

    None
}

/// Body of the first ``` fence, tolerating a language tag after the
/// opening fence and prose after the closing one.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let open = content.find("```")?;
    let rest = &content[open + 3..];

    // The language tag ("json") occupies the remainder of the opening
    // line; the body starts on the next one.
    let body = &rest[rest.find('\n')? + 1..];
    let close = body.find("```")?;

    (close > 0).then(|| &body[..close])
}

/// The `{...}` object whose open brace is the first byte of `s`, found
/// by brace depth. Braces inside string literals do not count; escaped
/// characters are consumed so `\"` cannot end a string.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut chars = s.char_indices();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' if in_string => {
                chars.next();
            }
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_raw_json() {
        let content = r#"{"disease_overview": "a fungal disease"}"#;
        assert_eq!(recover_json_object(content), Some(content));
    }

    #[test]
    fn test_recover_fenced_json() {
        let content = "```json\n{\"symptoms\": \"dark lesions\"}\n```";
        assert_eq!(
            recover_json_object(content),
            Some("{\"symptoms\": \"dark lesions\"}")
        );
    }

    #[test]
    fn test_recover_fenced_json_with_trailing_prose() {
        let content = "```json\n{\"cause\": \"Alternaria solani\"}\n```\nHope this helps!";
        assert_eq!(
            recover_json_object(content),
            Some("{\"cause\": \"Alternaria solani\"}")
        );
    }

    #[test]
    fn test_recover_json_embedded_in_prose() {
        let content = r#"Here is the requested data: {"prevention_tips": "rotate crops"} as JSON."#;
        assert_eq!(
            recover_json_object(content),
            Some(r#"{"prevention_tips": "rotate crops"}"#)
        );
    }

    #[test]
    fn test_recover_json_with_nested_braces_in_strings() {
        let content = r#"{"overview": "uses {braces} inside", "nested": {"k": "v"}}"#;
        assert_eq!(recover_json_object(content), Some(content));
    }

    #[test]
    fn test_recover_json_with_escaped_quotes_in_strings() {
        let content = r#"Sure: {"treatment": "apply \"protectant\" fungicide"} is the plan."#;
        assert_eq!(
            recover_json_object(content),
            Some(r#"{"treatment": "apply \"protectant\" fungicide"}"#)
        );
    }

    #[test]
    fn test_recover_rejects_non_json() {
        assert_eq!(recover_json_object("no json here at all"), None);
        assert_eq!(recover_json_object("{broken"), None);
    }

    #[test]
    fn test_transport_error_mapping() {
        let err = AdapterError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
        );
        assert!(matches!(err, AdapterError::Unreachable(_)));

        let err = AdapterError::from_status(reqwest::StatusCode::BAD_REQUEST, "nope".to_string());
        assert!(matches!(err, AdapterError::InvalidResponse(_)));
    }
}
