//! Diagnosis orchestrator
//!
//! Drives one diagnosis request through its tool sequence: classify,
//! then explain and synthesize in order, with the plant-info lookup
//! running concurrently since it depends only on the declared plant.
//!
//! Failure policy lives here, not in the dispatcher: transient tool
//! failures are retried exactly once, a failed explanation is
//! substituted from the fallback store, a failed synthesis just drops
//! the audio, and a failed classification fails the whole request.

use crate::adapters::{Classifier, Explainer, PlantInfoProvider, Synthesizer};
use crate::aggregator;
use crate::fallback::{self, FallbackStore};
use crate::tools::{self, ToolError, ToolRegistry};
use base64::Engine as _;
use sdk::errors::EngineError;
use sdk::types::{
    DiagnosisRequest, DiagnosisResponse, ExplanationResult, Plant, PlantInfo, ToolInput,
    ToolInvocationOutcome, ToolPayload,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Extra attempts after the first failure of a transient tool call.
const TOOL_RETRIES: usize = 1;

/// Phases a diagnosis request moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Classifying,
    Explaining,
    Synthesizing,
    Aggregating,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Classifying => "classifying",
            Phase::Explaining => "explaining",
            Phase::Synthesizing => "synthesizing",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// The engine's request orchestrator.
///
/// Holds the tool registry and the fallback store; both are shared
/// read-only, so the orchestrator itself is cheap to share across
/// concurrent requests.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    fallback: Arc<FallbackStore>,
}

impl Orchestrator {
    /// Create an orchestrator over a registry and a fallback store.
    pub fn new(registry: Arc<ToolRegistry>, fallback: Arc<FallbackStore>) -> Self {
        Self { registry, fallback }
    }

    /// Build an orchestrator directly from the four capability
    /// adapters and the embedded fallback table.
    pub fn from_adapters(
        classifier: Arc<dyn Classifier>,
        explainer: Arc<dyn Explainer>,
        synthesizer: Arc<dyn Synthesizer>,
        plant_info: Arc<dyn PlantInfoProvider>,
    ) -> Result<Self, EngineError> {
        let registry = Arc::new(ToolRegistry::new(
            classifier,
            explainer,
            synthesizer,
            plant_info,
        ));
        let fallback = Arc::new(FallbackStore::load_default()?);
        Ok(Self::new(registry, fallback))
    }

    /// Run one diagnosis request end to end.
    ///
    /// Returns `RequestFailure` when classification cannot be obtained;
    /// every later failure degrades the response instead of failing it.
    pub async fn diagnose(
        &self,
        request: &DiagnosisRequest,
    ) -> Result<DiagnosisResponse, EngineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("diagnose", %request_id, plant = %request.plant);

        async {
            let plant = request.plant;
            let image_b64 = base64::engine::general_purpose::STANDARD.encode(&request.image);

            let main_chain = self.run_main_chain(plant, image_b64);
            let info_chain = self.run_plant_info(plant);
            let (main, info_outcome) = tokio::join!(main_chain, info_chain);

            let mut outcomes = main?;
            outcomes.push(info_outcome);

            transition(Phase::Aggregating);
            let response = aggregator::aggregate(plant, &outcomes)?;
            transition(Phase::Done);
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Fetch general information about a plant, outside any diagnosis.
    pub async fn plant_info(&self, plant: Plant) -> Result<PlantInfo, EngineError> {
        let input = ToolInput::new().with_param("plant", json!(plant.to_string()));
        match self.invoke_with_retry(tools::PLANT_INFO, &input).await {
            Ok(ToolPayload::PlantInfo(info)) => Ok(info),
            Ok(_) => Err(EngineError::InvalidResponse {
                service: "plant-info".to_string(),
                detail: "unexpected payload kind".to_string(),
            }),
            Err(err) => Err(err.into_engine("plant-info")),
        }
    }

    /// The classify / explain / synthesize sequence.
    async fn run_main_chain(
        &self,
        plant: Plant,
        image_b64: String,
    ) -> Result<Vec<ToolInvocationOutcome>, EngineError> {
        let mut outcomes = Vec::with_capacity(3);

        transition(Phase::Classifying);
        let classify_input = ToolInput::new()
            .with_param("plant", json!(plant.to_string()))
            .with_param("image", json!(image_b64));

        let label = match self
            .invoke_with_retry(tools::CLASSIFY_LEAF, &classify_input)
            .await
        {
            Ok(ToolPayload::Classification(result)) => {
                let label = result.label.clone();
                outcomes.push(ToolInvocationOutcome::success(
                    tools::CLASSIFY_LEAF,
                    ToolPayload::Classification(result),
                ));
                Some(label)
            }
            Ok(_) => {
                outcomes.push(ToolInvocationOutcome::failed(
                    tools::CLASSIFY_LEAF,
                    "unexpected payload kind",
                ));
                None
            }
            Err(err) if !err.is_transient() => {
                // Caller bug at the dispatcher boundary; fail fast
                // rather than report it as a service degradation.
                return Err(err.into_engine("classifier"));
            }
            Err(err) => {
                warn!(tool = tools::CLASSIFY_LEAF, error = %err, "Classification failed");
                outcomes.push(ToolInvocationOutcome::failed(
                    tools::CLASSIFY_LEAF,
                    err.to_string(),
                ));
                None
            }
        };

        let Some(label) = label else {
            // Nothing to explain or speak without a label.
            outcomes.push(ToolInvocationOutcome::skipped(tools::EXPLAIN_DISEASE));
            outcomes.push(ToolInvocationOutcome::skipped(tools::SYNTHESIZE_SPEECH));
            return Ok(outcomes);
        };

        transition(Phase::Explaining);
        let explanation = self.explain_or_fallback(plant, &label, &mut outcomes).await;

        transition(Phase::Synthesizing);
        let text = speech_text(plant, &label, &explanation);
        let synth_input = ToolInput::new().with_param("text", json!(text));
        match self
            .invoke_with_retry(tools::SYNTHESIZE_SPEECH, &synth_input)
            .await
        {
            Ok(payload @ ToolPayload::Audio(_)) => {
                outcomes.push(ToolInvocationOutcome::success(
                    tools::SYNTHESIZE_SPEECH,
                    payload,
                ));
            }
            Ok(_) => {
                outcomes.push(ToolInvocationOutcome::failed(
                    tools::SYNTHESIZE_SPEECH,
                    "unexpected payload kind",
                ));
            }
            Err(err) => {
                warn!(tool = tools::SYNTHESIZE_SPEECH, error = %err, "Speech synthesis failed, continuing without audio");
                outcomes.push(ToolInvocationOutcome::failed(
                    tools::SYNTHESIZE_SPEECH,
                    err.to_string(),
                ));
            }
        }

        Ok(outcomes)
    }

    /// Invoke the explainer; on failure substitute from the fallback
    /// store, and on a fallback miss fall through to the generic
    /// degraded notice. The returned explanation is always populated.
    async fn explain_or_fallback(
        &self,
        plant: Plant,
        label: &str,
        outcomes: &mut Vec<ToolInvocationOutcome>,
    ) -> ExplanationResult {
        let input = ToolInput::new()
            .with_param("plant", json!(plant.to_string()))
            .with_param("disease", json!(label));

        let err = match self.invoke_with_retry(tools::EXPLAIN_DISEASE, &input).await {
            Ok(ToolPayload::Explanation(result)) => {
                outcomes.push(ToolInvocationOutcome::success(
                    tools::EXPLAIN_DISEASE,
                    ToolPayload::Explanation(result.clone()),
                ));
                return result;
            }
            Ok(_) => ToolError::InvalidInput {
                tool: tools::EXPLAIN_DISEASE.to_string(),
                reason: "unexpected payload kind".to_string(),
            },
            Err(err) => err,
        };

        warn!(tool = tools::EXPLAIN_DISEASE, error = %err, "Explanation service failed, substituting fallback");

        let explanation = match self.fallback.lookup(plant, label) {
            Some(entry) => entry,
            None => {
                // A miss means the table does not cover a label the
                // classifier can emit. That is a configuration gap,
                // logged apart from the service failure above.
                warn!(%plant, disease = %label, "Fallback table has no entry for this label, using generic notice");
                fallback::degraded_notice(plant, label)
            }
        };

        let mut outcome =
            ToolInvocationOutcome::failed(tools::EXPLAIN_DISEASE, err.to_string());
        outcome.payload = Some(ToolPayload::Explanation(explanation.clone()));
        outcomes.push(outcome);
        explanation
    }

    /// The plant-info lookup, independent of the main chain.
    async fn run_plant_info(&self, plant: Plant) -> ToolInvocationOutcome {
        let input = ToolInput::new().with_param("plant", json!(plant.to_string()));
        match self.invoke_with_retry(tools::PLANT_INFO, &input).await {
            Ok(payload @ ToolPayload::PlantInfo(_)) => {
                ToolInvocationOutcome::success(tools::PLANT_INFO, payload)
            }
            Ok(_) => ToolInvocationOutcome::failed(tools::PLANT_INFO, "unexpected payload kind"),
            Err(err) => {
                warn!(tool = tools::PLANT_INFO, error = %err, "Plant info lookup failed, continuing without it");
                ToolInvocationOutcome::failed(tools::PLANT_INFO, err.to_string())
            }
        }
    }

    /// Dispatch a tool, retrying transient failures up to
    /// `TOOL_RETRIES` extra times. `InvalidInput` and unknown-tool
    /// errors are returned immediately.
    async fn invoke_with_retry(
        &self,
        name: &str,
        input: &ToolInput,
    ) -> Result<ToolPayload, ToolError> {
        let mut attempt = 0;
        loop {
            match self.registry.dispatch(name, input).await {
                Ok(payload) => return Ok(payload),
                Err(err) if err.is_transient() && attempt < TOOL_RETRIES => {
                    warn!(tool = name, attempt, error = %err, "Tool failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn transition(phase: Phase) {
    debug!(%phase, "Entering phase");
}

/// Compose the text handed to the speech synthesizer.
fn speech_text(plant: Plant, label: &str, explanation: &ExplanationResult) -> String {
    if label.trim().eq_ignore_ascii_case("healthy") {
        format!(
            "Good news. Your {} leaf looks healthy. {}",
            plant, explanation.prevention
        )
    } else {
        format!(
            "Your {} leaf shows signs of {}. {} Recommended treatment: {}",
            plant, label, explanation.overview, explanation.treatment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::ExplanationSource;

    fn explanation() -> ExplanationResult {
        ExplanationResult {
            overview: "A fungal disease of foliage.".to_string(),
            symptoms: "Spots.".to_string(),
            causes: "Fungus.".to_string(),
            treatment: "Apply fungicide.".to_string(),
            prevention: "Rotate crops.".to_string(),
            source: ExplanationSource::Generated,
        }
    }

    #[test]
    fn test_speech_text_for_diseased_leaf() {
        let text = speech_text(Plant::Potato, "Early Blight", &explanation());
        assert!(text.contains("potato"));
        assert!(text.contains("Early Blight"));
        assert!(text.contains("Apply fungicide."));
    }

    #[test]
    fn test_speech_text_for_healthy_leaf() {
        let text = speech_text(Plant::Tomato, "Healthy", &explanation());
        assert!(text.contains("looks healthy"));
        assert!(text.contains("Rotate crops."));
        assert!(!text.contains("shows signs of"));
    }
}
