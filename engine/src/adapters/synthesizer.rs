use super::{AdapterError, Synthesizer};
use crate::config::SynthesizerConfig;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::AudioResult;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// HTTP adapter for the speech synthesis service.
///
/// Posts the speech text and expects a reference to the synthesized
/// artifact back. The engine never handles audio bytes itself; callers
/// fetch the artifact through the returned URL.
pub struct HttpSynthesizer {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SynthesizeWire {
    audio_url: String,
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    duration_secs: Option<f64>,
}

fn default_format() -> String {
    "mp3".to_string()
}

impl HttpSynthesizer {
    pub fn new(config: &SynthesizerConfig) -> Result<Self, EngineError> {
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
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> super::Result<AudioResult> {
        let url = format!("{}/synthesize", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(AdapterError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::from_status(status, body));
        }

        let wire: SynthesizeWire = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        if wire.audio_url.trim().is_empty() {
            return Err(AdapterError::InvalidResponse(
                "empty audio_url".to_string(),
            ));
        }

        Ok(AudioResult {
            url: wire.audio_url,
            format: wire.format,
            duration_secs: wire.duration_secs,
        })
    }
}
