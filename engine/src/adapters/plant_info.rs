use super::explainer::chat_completion;
use super::{recover_json_object, AdapterError, PlantInfoProvider};
use crate::config::{ExplainerConfig, PlantInfoConfig};
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{Plant, PlantInfo};
use serde::Deserialize;
use std::time::Duration;

/// Plant-info adapter backed by the same chat-completions endpoint as
/// the explainer, with its own (shorter) timeout.
pub struct ChatPlantInfo {
    config: ExplainerConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PlantInfoWire {
    description: String,
    usage: String,
    cultivation: String,
}

impl ChatPlantInfo {
    pub fn new(
        explainer: ExplainerConfig,
        plant_info: &PlantInfoConfig,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(plant_info.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: explainer,
            client,
        })
    }

    fn build_prompt(plant: Plant) -> String {
        format!(
            "You are an expert agriculture advisor. Provide crisp general information \
             about the crop {plant} in terms of agricultural importance and value.\n\
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
                 \"description\": \"\",\n\
                 \"usage\": \"\",\n\
                 \"cultivation\": \"\"\n\
             }}\n\
             \n\
             Fill each field with accurate information.\n\
             \n\
             PLANT: {plant}"
        )
    }
}

#[async_trait]
impl PlantInfoProvider for ChatPlantInfo {
    async fn describe(&self, plant: Plant) -> super::Result<PlantInfo> {
        let prompt = Self::build_prompt(plant);
        let content = chat_completion(&self.client, &self.config, prompt).await?;

        let json_str = recover_json_object(&content).ok_or_else(|| {
            AdapterError::InvalidResponse("model output contained no JSON object".to_string())
        })?;

        let wire: PlantInfoWire = serde_json::from_str(json_str)
            .map_err(|e| AdapterError::InvalidResponse(format!("out-of-schema JSON: {}", e)))?;

        Ok(PlantInfo {
            description: wire.description,
            usage: wire.usage,
            cultivation: wire.cultivation,
        })
    }
}
