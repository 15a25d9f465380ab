//! Fallback Knowledge Store
//!
//! A static table of canned explanations keyed by (plant, disease
//! label), used when the explanation service fails or returns unusable
//! output. The table is embedded at compile time, loaded once at
//! startup, and shared read-only across concurrent requests. No writer
//! exists after initialization, so no locking is needed.
//!
//! A lookup miss is not a runtime fault: it means the table does not
//! cover a label the classifier can emit, which is a configuration gap
//! the orchestrator logs distinctly from adapter failures.

use sdk::errors::EngineError;
use sdk::types::{ExplanationResult, ExplanationSource, Plant};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Canned cure table shipped with the engine, covering the
/// classifier's full label space.
const EMBEDDED_CURE_DATA: &str = include_str!("../../data/plant_disease_cure.json");

#[derive(Debug, Deserialize)]
struct CureEntry {
    overview: String,
    symptoms: String,
    causes: String,
    treatment: String,
    prevention: String,
}

/// Static mapping from (plant, disease) to a canned explanation.
pub struct FallbackStore {
    entries: HashMap<(Plant, String), ExplanationResult>,
}

impl FallbackStore {
    /// Load the embedded cure table.
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_json_str(EMBEDDED_CURE_DATA)
    }

    /// Build a store from a JSON document of the shape
    /// `{ "<plant>": { "<disease>": { overview, symptoms, causes,
    /// treatment, prevention } } }`.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let raw: HashMap<String, HashMap<String, CureEntry>> = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("Failed to parse cure data: {}", e)))?;

        let mut entries = HashMap::new();
        for (plant_key, diseases) in raw {
            let plant = Plant::from_str(&plant_key).map_err(|e| {
                EngineError::Config(format!("Unknown plant in cure data: {}", e))
            })?;

            for (label, entry) in diseases {
                entries.insert(
                    (plant, normalize(&label)),
                    ExplanationResult {
                        overview: entry.overview,
                        symptoms: entry.symptoms,
                        causes: entry.causes,
                        treatment: entry.treatment,
                        prevention: entry.prevention,
                        source: ExplanationSource::Fallback,
                    },
                );
            }
        }

        Ok(Self { entries })
    }

    /// Look up the canned explanation for a (plant, disease) pair.
    ///
    /// Lookups are case-normalized. `None` means the table has no entry
    /// for this label: a configuration gap, not a runtime fault.
    pub fn lookup(&self, plant: Plant, disease: &str) -> Option<ExplanationResult> {
        self.entries.get(&(plant, normalize(disease))).cloned()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generic degraded-service explanation, used when both the explanation
/// service and the fallback table come up empty. Always non-empty so
/// the response invariant holds.
pub fn degraded_notice(plant: Plant, disease: &str) -> ExplanationResult {
    let notice = format!(
        "Detailed guidance for {} on {} is temporarily unavailable. \
         Please consult a local plant pathologist or agricultural extension service.",
        disease, plant
    );
    ExplanationResult {
        overview: notice.clone(),
        symptoms: notice.clone(),
        causes: notice.clone(),
        treatment: notice.clone(),
        prevention: notice,
        source: ExplanationSource::Fallback,
    }
}

/// Normalize a disease label for lookup: trim, lowercase, collapse
/// internal whitespace.
fn normalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
