//! Result Aggregator
//!
//! Folds the per-tool invocation outcomes of one diagnosis request into
//! the single response returned to the caller. Degradation is carried
//! per field: a failed speech or plant-info path never aborts the
//! request, while a failed classification always does, since nothing
//! downstream is meaningful without a label.

use crate::tools;
use sdk::errors::EngineError;
use sdk::types::{
    ClassificationResult, DiagnosisResponse, ExplanationResult, Plant, ToolInvocationOutcome,
    ToolPayload, ToolStatus,
};
use tracing::debug;

fn find<'a>(
    outcomes: &'a [ToolInvocationOutcome],
    tool: &str,
) -> Option<&'a ToolInvocationOutcome> {
    outcomes.iter().find(|o| o.tool == tool)
}

fn classification(outcomes: &[ToolInvocationOutcome]) -> Result<ClassificationResult, EngineError> {
    let outcome = find(outcomes, tools::CLASSIFY_LEAF);
    match outcome {
        Some(o) if o.status == ToolStatus::Success => match &o.payload {
            Some(ToolPayload::Classification(result)) => Ok(result.clone()),
            _ => Err(EngineError::RequestFailure(
                "classification succeeded without a classification payload".to_string(),
            )),
        },
        Some(o) => Err(EngineError::RequestFailure(format!(
            "leaf classification failed: {}",
            o.error.as_deref().unwrap_or("unknown error")
        ))),
        None => Err(EngineError::RequestFailure(
            "no classification was attempted".to_string(),
        )),
    }
}

fn explanation(
    outcomes: &[ToolInvocationOutcome],
) -> Result<(ExplanationResult, bool), EngineError> {
    // The orchestrator substitutes a fallback payload when the service
    // fails, so a populated explanation is always present here. Its
    // absence means the invocation sequence itself was broken.
    let outcome = find(outcomes, tools::EXPLAIN_DISEASE).ok_or_else(|| {
        EngineError::RequestFailure("no explanation was produced".to_string())
    })?;

    match &outcome.payload {
        Some(ToolPayload::Explanation(result)) => {
            Ok((result.clone(), outcome.status != ToolStatus::Success))
        }
        _ => Err(EngineError::RequestFailure(
            "no explanation was produced".to_string(),
        )),
    }
}

/// Fold tool outcomes into the caller-facing response.
///
/// Fails only when classification did not succeed; every other missing
/// or failed piece is reported through its degradation flag.
pub fn aggregate(
    plant: Plant,
    outcomes: &[ToolInvocationOutcome],
) -> Result<DiagnosisResponse, EngineError> {
    let classification = classification(outcomes)?;
    let (explanation, explanation_degraded) = explanation(outcomes)?;

    let audio = find(outcomes, tools::SYNTHESIZE_SPEECH).and_then(|o| match &o.payload {
        Some(ToolPayload::Audio(result)) if o.status == ToolStatus::Success => {
            Some(result.clone())
        }
        _ => None,
    });
    let audio_degraded = audio.is_none();

    let plant_info = find(outcomes, tools::PLANT_INFO).and_then(|o| match &o.payload {
        Some(ToolPayload::PlantInfo(result)) if o.status == ToolStatus::Success => {
            Some(result.clone())
        }
        _ => None,
    });
    let plant_info_degraded = plant_info.is_none();

    debug!(
        %plant,
        label = %classification.label,
        explanation_degraded,
        audio_degraded,
        plant_info_degraded,
        "Aggregated diagnosis response"
    );

    Ok(DiagnosisResponse {
        plant,
        classification,
        explanation,
        explanation_degraded,
        audio,
        audio_degraded,
        plant_info,
        plant_info_degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{AudioResult, ExplanationSource, PlantInfo};

    fn classified() -> ToolInvocationOutcome {
        ToolInvocationOutcome::success(
            tools::CLASSIFY_LEAF,
            ToolPayload::Classification(ClassificationResult {
                label: "Early Blight".to_string(),
                confidence: 0.93,
            }),
        )
    }

    fn explained(source: ExplanationSource) -> ExplanationResult {
        ExplanationResult {
            overview: "o".to_string(),
            symptoms: "s".to_string(),
            causes: "c".to_string(),
            treatment: "t".to_string(),
            prevention: "p".to_string(),
            source,
        }
    }

    #[test]
    fn test_full_success() {
        let outcomes = vec![
            classified(),
            ToolInvocationOutcome::success(
                tools::EXPLAIN_DISEASE,
                ToolPayload::Explanation(explained(ExplanationSource::Generated)),
            ),
            ToolInvocationOutcome::success(
                tools::SYNTHESIZE_SPEECH,
                ToolPayload::Audio(AudioResult {
                    url: "/audio/a.mp3".to_string(),
                    format: "mp3".to_string(),
                    duration_secs: Some(4.2),
                }),
            ),
            ToolInvocationOutcome::success(
                tools::PLANT_INFO,
                ToolPayload::PlantInfo(PlantInfo {
                    description: "d".to_string(),
                    usage: "u".to_string(),
                    cultivation: "c".to_string(),
                }),
            ),
        ];

        let response = aggregate(Plant::Potato, &outcomes).unwrap();
        assert!(!response.explanation_degraded);
        assert!(!response.audio_degraded);
        assert!(!response.plant_info_degraded);
        assert_eq!(response.classification.label, "Early Blight");
    }

    #[test]
    fn test_classification_failure_fails_the_request() {
        let outcomes = vec![
            ToolInvocationOutcome::failed(tools::CLASSIFY_LEAF, "service unreachable"),
            ToolInvocationOutcome::skipped(tools::EXPLAIN_DISEASE),
            ToolInvocationOutcome::skipped(tools::SYNTHESIZE_SPEECH),
        ];

        let err = aggregate(Plant::Tomato, &outcomes).unwrap_err();
        assert!(matches!(err, EngineError::RequestFailure(_)));
    }

    #[test]
    fn test_fallback_explanation_sets_degraded_flag() {
        let mut failed_with_fallback = ToolInvocationOutcome::failed(
            tools::EXPLAIN_DISEASE,
            "explanation service timed out",
        );
        failed_with_fallback.payload =
            Some(ToolPayload::Explanation(explained(ExplanationSource::Fallback)));

        let outcomes = vec![classified(), failed_with_fallback];
        let response = aggregate(Plant::Potato, &outcomes).unwrap();
        assert!(response.explanation_degraded);
        assert_eq!(response.explanation.source, ExplanationSource::Fallback);
    }

    #[test]
    fn test_missing_audio_is_degraded_not_fatal() {
        let outcomes = vec![
            classified(),
            ToolInvocationOutcome::success(
                tools::EXPLAIN_DISEASE,
                ToolPayload::Explanation(explained(ExplanationSource::Generated)),
            ),
            ToolInvocationOutcome::failed(tools::SYNTHESIZE_SPEECH, "timed out"),
        ];

        let response = aggregate(Plant::Potato, &outcomes).unwrap();
        assert!(response.audio.is_none());
        assert!(response.audio_degraded);
        assert!(!response.explanation_degraded);
    }

    #[test]
    fn test_missing_plant_info_is_degraded_not_fatal() {
        let outcomes = vec![
            classified(),
            ToolInvocationOutcome::success(
                tools::EXPLAIN_DISEASE,
                ToolPayload::Explanation(explained(ExplanationSource::Generated)),
            ),
            ToolInvocationOutcome::failed(tools::PLANT_INFO, "unreachable"),
        ];

        let response = aggregate(Plant::Pepper, &outcomes).unwrap();
        assert!(response.plant_info.is_none());
        assert!(response.plant_info_degraded);
    }

    #[test]
    fn test_missing_explanation_outcome_is_a_request_failure() {
        let outcomes = vec![classified()];
        let err = aggregate(Plant::Potato, &outcomes).unwrap_err();
        assert!(matches!(err, EngineError::RequestFailure(_)));
    }
}
