//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - diagnose: Run one leaf image through the full diagnosis flow
//! - plant-info: Fetch general information about a plant
//! - tools: List registered tools and their input schemas
//! - doctor: Validate configuration and check service settings

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::classifier::HttpClassifier;
use crate::adapters::explainer::ChatExplainer;
use crate::adapters::plant_info::ChatPlantInfo;
use crate::adapters::synthesizer::HttpSynthesizer;
use crate::adapters::{Classifier, Explainer, PlantInfoProvider, Synthesizer};
use crate::agent::Orchestrator;
use crate::config::Config;
use crate::tools::ToolRegistry;
use sdk::errors::{EngineError, LeafErrorExt};
use sdk::types::{DiagnosisRequest, DiagnosisResponse, Plant};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Attach the user-facing hint to an engine error before it bubbles
/// out through anyhow.
fn engine_err(err: EngineError) -> anyhow::Error {
    let hint = err.user_hint().to_string();
    anyhow::Error::new(err).context(hint)
}

/// Wire the HTTP adapters from config into an orchestrator.
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let classifier: Arc<dyn Classifier> =
        Arc::new(HttpClassifier::new(&config.classifier).map_err(engine_err)?);
    let explainer: Arc<dyn Explainer> =
        Arc::new(ChatExplainer::new(config.explainer.clone()).map_err(engine_err)?);
    let synthesizer: Arc<dyn Synthesizer> =
        Arc::new(HttpSynthesizer::new(&config.synthesizer).map_err(engine_err)?);
    let plant_info: Arc<dyn PlantInfoProvider> = Arc::new(
        ChatPlantInfo::new(config.explainer.clone(), &config.plant_info).map_err(engine_err)?,
    );

    Orchestrator::from_adapters(classifier, explainer, synthesizer, plant_info)
        .map_err(engine_err)
}

/// Diagnose a leaf image
///
/// Reads the image, runs the full diagnosis flow, and prints the
/// (possibly degraded) response.
pub async fn handle_diagnose(
    plant: String,
    image: &Path,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let plant: Plant = plant
        .parse()
        .map_err(|reason: String| anyhow::anyhow!(reason))?;

    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image at {}", image.display()))?;

    let orchestrator = build_orchestrator(config)?;
    let request = DiagnosisRequest::new(bytes, plant);
    let response = orchestrator.diagnose(&request).await.map_err(engine_err)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => print_diagnosis(&response),
    }
    Ok(())
}

fn print_diagnosis(response: &DiagnosisResponse) {
    println!(
        "Diagnosis: {} ({:.1}% confidence)",
        response.classification.label,
        response.classification.confidence * 100.0
    );
    println!();
    println!("Overview:   {}", response.explanation.overview);
    println!("Symptoms:   {}", response.explanation.symptoms);
    println!("Causes:     {}", response.explanation.causes);
    println!("Treatment:  {}", response.explanation.treatment);
    println!("Prevention: {}", response.explanation.prevention);
    if response.explanation_degraded {
        println!();
        println!("Note: the explanation service was unavailable; this guidance");
        println!("came from the built-in knowledge base.");
    }

    println!();
    match &response.audio {
        Some(audio) => println!("Audio: {} ({})", audio.url, audio.format),
        None => println!("Audio: unavailable"),
    }

    if let Some(info) = &response.plant_info {
        println!();
        println!("About this plant:");
        println!("  {}", info.description);
        println!("  Usage: {}", info.usage);
        println!("  Cultivation: {}", info.cultivation);
    }
}

/// Fetch general information about a plant
pub async fn handle_plant_info(
    plant: String,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let plant: Plant = plant
        .parse()
        .map_err(|reason: String| anyhow::anyhow!(reason))?;

    let orchestrator = build_orchestrator(config)?;
    let info = orchestrator.plant_info(plant).await.map_err(engine_err)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("{}", info.description);
            println!();
            println!("Usage: {}", info.usage);
            println!("Cultivation: {}", info.cultivation);
        }
    }
    Ok(())
}

/// List registered tools and their input schemas
pub fn handle_tools(format: OutputFormat) -> Result<()> {
    let specs = ToolRegistry::specs();

    match format {
        OutputFormat::Json => {
            let listing: Vec<_> = specs
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "description": s.description,
                        "required_fields": s.required_fields,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            println!("Registered tools ({}):", specs.len());
            println!();
            for spec in specs {
                println!("  {}", spec.name);
                println!("    {}", spec.description);
                println!("    fields: {}", spec.required_fields.join(", "));
            }
        }
    }
    Ok(())
}

/// Validate configuration and check service settings
pub fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let api_key_set = std::env::var(&config.explainer.api_key_env).is_ok();

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "classifier_url": config.classifier.base_url,
                "explainer_url": config.explainer.base_url,
                "explainer_model": config.explainer.model,
                "synthesizer_url": config.synthesizer.base_url,
                "api_key_env": config.explainer.api_key_env,
                "api_key_set": api_key_set,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Configuration OK.");
            println!("  Classifier:  {}", config.classifier.base_url);
            println!(
                "  Explainer:   {} (model {})",
                config.explainer.base_url, config.explainer.model
            );
            println!("  Synthesizer: {}", config.synthesizer.base_url);
            println!(
                "  API key:     {} is {}",
                config.explainer.api_key_env,
                if api_key_set { "set" } else { "NOT set" }
            );
        }
    }
    Ok(())
}
