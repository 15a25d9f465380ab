//! Tool Registry & Dispatcher
//!
//! Declares each backend capability as a named, schema-bound tool the
//! orchestrator can invoke, and resolves a tool name to an adapter
//! call. `dispatch` validates the dynamic input against the tool's
//! declared schema before the adapter is touched: a schema mismatch
//! fails fast with `InvalidInput` and causes no side effects.
//!
//! The dispatcher never swallows adapter failures and never substitutes
//! fallbacks: adapter failure kinds are returned verbatim, and fallback
//! substitution is an orchestrator-level policy decision.

use crate::adapters::{AdapterError, Classifier, Explainer, PlantInfoProvider, Synthesizer};
use base64::Engine as _;
use sdk::errors::EngineError;
use sdk::types::{Plant, ToolInput, ToolPayload};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Tool name: leaf image classification
pub const CLASSIFY_LEAF: &str = "classify_leaf";

/// Tool name: disease explanation generation
pub const EXPLAIN_DISEASE: &str = "explain_disease";

/// Tool name: speech synthesis
pub const SYNTHESIZE_SPEECH: &str = "synthesize_speech";

/// Tool name: plant profile lookup
pub const PLANT_INFO: &str = "plant_info";

/// Errors the dispatcher can report.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Input failed schema validation; the adapter was never invoked
    #[error("invalid input for '{tool}': {reason}")]
    InvalidInput { tool: String, reason: String },

    /// The adapter failed; the kind is passed through verbatim
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl ToolError {
    /// Whether the orchestrator's retry policy applies.
    ///
    /// Only adapter failures (`Unreachable`/`Timeout`/`InvalidResponse`)
    /// are transient; `InvalidInput` is a caller bug and retrying it
    /// would fail identically.
    pub fn is_transient(&self) -> bool {
        matches!(self, ToolError::Adapter(_))
    }

    /// Lift a dispatcher error to the engine boundary, naming the
    /// service it concerns.
    pub fn into_engine(self, service: &str) -> EngineError {
        match self {
            ToolError::UnknownTool(name) => EngineError::ToolNotFound(name),
            ToolError::InvalidInput { tool, reason } => EngineError::InvalidInput { tool, reason },
            ToolError::Adapter(AdapterError::Unreachable(detail)) => {
                EngineError::Unreachable(format!("{}: {}", service, detail))
            }
            ToolError::Adapter(AdapterError::Timeout) => EngineError::Timeout(service.to_string()),
            ToolError::Adapter(AdapterError::InvalidResponse(detail)) => {
                EngineError::InvalidResponse {
                    service: service.to_string(),
                    detail,
                }
            }
        }
    }
}

/// Declared schema of one tool: its name and the required string
/// fields its input must carry.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: &'static str,

    /// One-line description, for listing
    pub description: &'static str,

    /// Required input fields (all string-valued)
    pub required_fields: &'static [&'static str],
}

const TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: CLASSIFY_LEAF,
        description: "Classify a leaf image against the declared plant's disease label space",
        required_fields: &["plant", "image"],
    },
    ToolSpec {
        name: EXPLAIN_DISEASE,
        description: "Generate a structured cause/cure explanation for a diagnosed disease",
        required_fields: &["plant", "disease"],
    },
    ToolSpec {
        name: SYNTHESIZE_SPEECH,
        description: "Synthesize spoken audio for the final explanation text",
        required_fields: &["text"],
    },
    ToolSpec {
        name: PLANT_INFO,
        description: "Fetch general information about a supported plant",
        required_fields: &["plant"],
    },
];

/// Registry binding tool names to capability adapters.
///
/// Shared read-only across concurrent requests.
pub struct ToolRegistry {
    classifier: Arc<dyn Classifier>,
    explainer: Arc<dyn Explainer>,
    synthesizer: Arc<dyn Synthesizer>,
    plant_info: Arc<dyn PlantInfoProvider>,
}

impl ToolRegistry {
    /// Create a registry over the four capability adapters.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        explainer: Arc<dyn Explainer>,
        synthesizer: Arc<dyn Synthesizer>,
        plant_info: Arc<dyn PlantInfoProvider>,
    ) -> Self {
        Self {
            classifier,
            explainer,
            synthesizer,
            plant_info,
        }
    }

    /// Declared specs of every registered tool.
    pub fn specs() -> &'static [ToolSpec] {
        TOOL_SPECS
    }

    fn spec(name: &str) -> Option<&'static ToolSpec> {
        TOOL_SPECS.iter().find(|s| s.name == name)
    }

    /// Dispatch a tool call by name.
    ///
    /// Validates `input` against the tool's declared schema first; on
    /// mismatch fails with `InvalidInput` without invoking the adapter.
    /// Adapter failures are returned verbatim.
    pub async fn dispatch(&self, name: &str, input: &ToolInput) -> Result<ToolPayload, ToolError> {
        let spec = Self::spec(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        validate_input(spec, input)?;
        debug!(tool = name, "Dispatching tool");

        match name {
            CLASSIFY_LEAF => {
                let plant = parse_plant(spec, input)?;
                let image = decode_image(spec, input)?;
                let result = self.classifier.classify(&image, plant).await?;
                Ok(ToolPayload::Classification(result))
            }
            EXPLAIN_DISEASE => {
                let plant = parse_plant(spec, input)?;
                // validated present by the schema check
                let disease = input.param_str("disease").unwrap_or_default();
                let result = self.explainer.explain(plant, disease).await?;
                Ok(ToolPayload::Explanation(result))
            }
            SYNTHESIZE_SPEECH => {
                let text = input.param_str("text").unwrap_or_default();
                let result = self.synthesizer.synthesize(text).await?;
                Ok(ToolPayload::Audio(result))
            }
            PLANT_INFO => {
                let plant = parse_plant(spec, input)?;
                let result = self.plant_info.describe(plant).await?;
                Ok(ToolPayload::PlantInfo(result))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

/// Check every declared field is present, string-valued, and non-empty.
fn validate_input(spec: &ToolSpec, input: &ToolInput) -> Result<(), ToolError> {
    for field in spec.required_fields {
        match input.params.get(*field) {
            None => {
                return Err(ToolError::InvalidInput {
                    tool: spec.name.to_string(),
                    reason: format!("missing field '{}'", field),
                });
            }
            Some(value) => match value.as_str() {
                None => {
                    return Err(ToolError::InvalidInput {
                        tool: spec.name.to_string(),
                        reason: format!("field '{}' must be a string", field),
                    });
                }
                Some(s) if s.trim().is_empty() => {
                    return Err(ToolError::InvalidInput {
                        tool: spec.name.to_string(),
                        reason: format!("field '{}' must not be empty", field),
                    });
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}

fn parse_plant(spec: &ToolSpec, input: &ToolInput) -> Result<Plant, ToolError> {
    let raw = input.param_str("plant").unwrap_or_default();
    Plant::from_str(raw).map_err(|reason| ToolError::InvalidInput {
        tool: spec.name.to_string(),
        reason,
    })
}

fn decode_image(spec: &ToolSpec, input: &ToolInput) -> Result<Vec<u8>, ToolError> {
    let raw = input.param_str("image").unwrap_or_default();
    base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|e| ToolError::InvalidInput {
            tool: spec.name.to_string(),
            reason: format!("field 'image' is not valid base64: {}", e),
        })
}
