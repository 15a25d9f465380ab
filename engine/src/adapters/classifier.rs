use super::{AdapterError, Classifier};
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use base64::Engine as _;
use sdk::errors::EngineError;
use sdk::types::{ClassificationResult, Plant};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// HTTP adapter for the CNN classifier service.
///
/// Posts the image (base64-encoded) together with the declared plant
/// category and expects `{label, confidence}` back. The CNN itself is
/// an opaque external service; this adapter only owns the wire contract
/// and the error mapping.
pub struct HttpClassifier {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ClassifyWire {
    label: String,
    confidence: f32,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &[u8], plant: Plant) -> super::Result<ClassificationResult> {
        let url = format!("{}/classify", self.base_url);

        let payload = json!({
            "plant": plant.to_string(),
            "image": base64::engine::general_purpose::STANDARD.encode(image),
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(AdapterError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::from_status(status, body));
        }

        let wire: ClassifyWire = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        if !(0.0..=1.0).contains(&wire.confidence) {
            return Err(AdapterError::InvalidResponse(format!(
                "confidence {} outside [0, 1]",
                wire.confidence
            )));
        }

        if wire.label.trim().is_empty() {
            return Err(AdapterError::InvalidResponse(
                "empty disease label".to_string(),
            ));
        }

        Ok(ClassificationResult {
            label: wire.label,
            confidence: wire.confidence,
        })
    }
}
