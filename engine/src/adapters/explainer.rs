use super::{recover_json_object, AdapterError, Explainer};
use crate::config::ExplainerConfig;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{ExplanationResult, ExplanationSource, Plant};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Explanation adapter backed by an OpenAI-compatible chat-completions
/// endpoint.
///
/// The model is instructed to answer with a bare JSON object. Models
/// routinely violate that instruction, so the raw content goes through
/// `recover_json_object` before schema parsing; anything that still
/// fails to parse is an `InvalidResponse` and left to the
/// orchestrator's retry/fallback policy.
pub struct ChatExplainer {
    config: ExplainerConfig,
    client: reqwest::Client,
}

/// Field names as the prompt requests them from the model.
#[derive(Debug, Deserialize)]
struct ExplanationWire {
    disease_overview: String,
    symptoms: String,
    cause: String,
    recommended_treatment: String,
    prevention_tips: String,
}

impl ChatExplainer {
    pub fn new(config: ExplainerConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn build_prompt(plant: Plant, disease: &str) -> String {
        format!(
            "You are an expert agriculture advisor.\n\
             \n\
             STRICT RULES:\n\
             - Respond ONLY with valid JSON.\n\
             - Do NOT wrap JSON in backticks.\n\
             - Do NOT include any explanation before or after the JSON.\n\
             - Do NOT use markdown formatting.\n\
             \n\
             Return a JSON object exactly like this:\n\
             \n\
             {{\n\
                 \"disease_overview\": \"\",\n\
                 \"symptoms\": \"\",\n\
                 \"cause\": \"\",\n\
                 \"recommended_treatment\": \"\",\n\
                 \"prevention_tips\": \"\"\n\
             }}\n\
             \n\
             Fill each field with accurate information.\n\
             \n\
             PLANT: {}\n\
             DISEASE: {}",
            plant, disease
        )
    }
}

/// Issue a chat-completions request and return the assistant content.
///
/// Shared by the explainer and plant-info adapters, which talk to the
/// same endpoint with different prompts.
pub(super) async fn chat_completion(
    client: &reqwest::Client,
    config: &ExplainerConfig,
    prompt: String,
) -> super::Result<String> {
    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        AdapterError::Unreachable(format!(
            "API key environment variable '{}' is not set",
            config.api_key_env
        ))
    })?;

    let url = format!(
        "{}/chat/completions",
        config.base_url.trim_end_matches('/')
    );

    let payload = json!({
        "model": config.model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0.2,
    });

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await
        .map_err(AdapterError::from_transport)?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status(status, body));
    }

    let data: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

    data.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(String::from)
        .ok_or_else(|| AdapterError::InvalidResponse("no message content in response".to_string()))
}

#[async_trait]
impl Explainer for ChatExplainer {
    async fn explain(&self, plant: Plant, disease: &str) -> super::Result<ExplanationResult> {
        let prompt = Self::build_prompt(plant, disease);
        let content = chat_completion(&self.client, &self.config, prompt).await?;

        let json_str = recover_json_object(&content).ok_or_else(|| {
            AdapterError::InvalidResponse("model output contained no JSON object".to_string())
        })?;

        let wire: ExplanationWire = serde_json::from_str(json_str)
            .map_err(|e| AdapterError::InvalidResponse(format!("out-of-schema JSON: {}", e)))?;

        Ok(ExplanationResult {
            overview: wire.disease_overview,
            symptoms: wire.symptoms,
            causes: wire.cause,
            treatment: wire.recommended_treatment,
            prevention: wire.prevention_tips,
            source: ExplanationSource::Generated,
        })
    }
}
