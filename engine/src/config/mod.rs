//! Configuration management
//!
//! This module handles loading, validation, and management of the
//! LeafScan configuration. Configuration is stored in TOML format at
//! ~/.leafscan/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **classifier**: Classifier service endpoint and timeout
//! - **explainer**: Chat-completions endpoint, model, API key env var,
//!   and timeout (also used by the plant-info tool)
//! - **synthesizer**: Speech synthesis endpoint and timeout
//! - **plant_info**: Timeout for the plant-info tool
//!
//! # Path Expansion
//!
//! The configuration system automatically expands ~ to the user's home
//! directory and creates the config directory on first run.

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Represents the complete LeafScan configuration loaded from
/// ~/.leafscan/config.toml. Every section has usable defaults, so a
/// missing file is written out rather than treated as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Classifier service settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Explanation service settings
    #[serde(default)]
    pub explainer: ExplainerConfig,

    /// Speech synthesis service settings
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,

    /// Plant-info tool settings
    #[serde(default)]
    pub plant_info: PlantInfoConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Classifier service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the classifier service
    #[serde(default = "default_classifier_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_long_timeout")]
    pub timeout_secs: u64,
}

/// Explanation service configuration (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainerConfig {
    /// Base URL of the chat-completions API
    #[serde(default = "default_explainer_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_explainer_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_long_timeout")]
    pub timeout_secs: u64,
}

/// Speech synthesis service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Base URL of the synthesis service
    #[serde(default = "default_synthesizer_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_long_timeout")]
    pub timeout_secs: u64,
}

/// Plant-info tool configuration
///
/// Plant-info reuses the explainer's endpoint and model; only the
/// timeout differs, since the lookup is a short single-turn call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantInfoConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_classifier_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_explainer_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_explainer_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_synthesizer_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_long_timeout() -> u64 {
    30
}

fn default_short_timeout() -> u64 {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_base_url(),
            timeout_secs: default_long_timeout(),
        }
    }
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            base_url: default_explainer_base_url(),
            model: default_explainer_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_long_timeout(),
        }
    }
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_synthesizer_base_url(),
            timeout_secs: default_long_timeout(),
        }
    }
}

impl Default for PlantInfoConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_short_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            classifier: ClassifierConfig::default(),
            explainer: ExplainerConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            plant_info: PlantInfoConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration file path: ~/.leafscan/config.toml
    pub fn default_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".leafscan").join("config.toml"))
    }

    /// Load configuration from the default location, creating it with
    /// defaults on first run.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            let config = Config::default();
            config.save_to_path(&path)?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config at {:?}: {}", path, e))
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a specific path, creating parent
    /// directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config dir {:?}: {}", parent, e))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents).map_err(|e| {
            EngineError::Config(format!("Failed to write config at {:?}: {}", path, e))
        })
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), EngineError> {
        const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Use one of: {}",
                self.core.log_level,
                LEVELS.join(", ")
            )));
        }

        for (name, url) in [
            ("classifier", &self.classifier.base_url),
            ("explainer", &self.explainer.base_url),
            ("synthesizer", &self.synthesizer.base_url),
        ] {
            if url.is_empty() {
                return Err(EngineError::Config(format!(
                    "{} base_url must not be empty",
                    name
                )));
            }
        }

        for (name, timeout) in [
            ("classifier", self.classifier.timeout_secs),
            ("explainer", self.explainer.timeout_secs),
            ("synthesizer", self.synthesizer.timeout_secs),
            ("plant_info", self.plant_info.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(EngineError::Config(format!(
                    "{} timeout_secs must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }
}
