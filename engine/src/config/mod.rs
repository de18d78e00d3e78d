//! Configuration management
//!
//! This module handles loading, validation, and management of the tutor configuration.
//! Configuration is stored in TOML format at ~/.stem-tutor/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: Model backend selection and per-provider settings
//! - **tutor**: Retrieval depth, generation parameters, level tracker policy
//! - **store**: Knowledge store backend and collection naming
//!
//! # Path Expansion
//!
//! `~` in `core.data_dir` and `store.path` is expanded to the user's home
//! directory, and the data directory is created when missing.
//!
//! # Examples
//!
//! ```no_run
//! use tutor_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.llm.default_provider);
//! println!("References per question: {}", config.tutor.reference_count);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tutor_sdk::errors::EngineError;

/// Providers the engine knows how to build
pub const VALID_PROVIDERS: [&str; 3] = ["ollama", "openai", "groq"];

/// Knowledge store backends
pub const VALID_STORE_BACKENDS: [&str; 2] = ["sqlite", "memory"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Model backend configuration
    pub llm: LLMConfig,

    /// Tutoring engine tuning
    #[serde(default)]
    pub tutor: TutorConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for every model call (ollama, openai, groq)
    pub default_provider: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Groq provider settings (OpenAI-compatible API)
    #[serde(default)]
    pub groq: GroqConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key (keychain is the fallback)
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,
}

/// Groq provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// Base URL for Groq's OpenAI-compatible API
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_groq_model")]
    pub model: String,

    /// Environment variable holding the API key (keychain is the fallback)
    #[serde(default = "default_groq_api_key_env")]
    pub api_key_env: String,
}

/// Tutoring engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Number of reference problems retrieved per question
    #[serde(default = "default_reference_count")]
    pub reference_count: usize,

    /// Classifier call parameters
    #[serde(default = "default_classifier_generation")]
    pub classifier: GenerationConfig,

    /// Solution call parameters
    #[serde(default = "default_solution_generation")]
    pub solution: GenerationConfig,

    /// Practice problem call parameters
    #[serde(default = "default_practice_generation")]
    pub practice: GenerationConfig,

    /// Level tracker policy
    #[serde(default)]
    pub level: LevelConfig,
}

/// Sampling parameters for one kind of model call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Level tracker policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Number of most recent outcomes considered per subject
    #[serde(default = "default_level_window")]
    pub window: usize,

    /// Advance one tier when the recent rate is strictly above this
    #[serde(default = "default_advance_above")]
    pub advance_above: f64,

    /// Retreat one tier when the recent rate is strictly below this
    #[serde(default = "default_retreat_below")]
    pub retreat_below: f64,
}

/// Knowledge store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend (sqlite, memory)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path; defaults to `<data_dir>/knowledge.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Prefix prepended to the subject key to name a collection
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.stem-tutor")
}

fn default_request_timeout() -> u64 {
    120
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_groq_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_reference_count() -> usize {
    crate::retrieval::DEFAULT_REFERENCE_COUNT
}

fn default_classifier_generation() -> GenerationConfig {
    GenerationConfig {
        temperature: 0.3,
        max_tokens: 500,
    }
}

fn default_solution_generation() -> GenerationConfig {
    GenerationConfig {
        temperature: 0.4,
        max_tokens: 2000,
    }
}

fn default_practice_generation() -> GenerationConfig {
    GenerationConfig {
        temperature: 0.7,
        max_tokens: 1000,
    }
}

fn default_level_window() -> usize {
    5
}

fn default_advance_above() -> f64 {
    0.8
}

fn default_retreat_below() -> f64 {
    0.3
}

fn default_store_backend() -> String {
    "sqlite".to_string()
}

fn default_collection_prefix() -> String {
    "stem_".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_base_url(),
            model: default_groq_model(),
            api_key_env: default_groq_api_key_env(),
        }
    }
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            reference_count: default_reference_count(),
            classifier: default_classifier_generation(),
            solution: default_solution_generation(),
            practice: default_practice_generation(),
            level: LevelConfig::default(),
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            window: default_level_window(),
            advance_above: default_advance_above(),
            retreat_below: default_retreat_below(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
            collection_prefix: default_collection_prefix(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            llm: LLMConfig {
                default_provider: "groq".to_string(),
                request_timeout_secs: default_request_timeout(),
                ollama: OllamaConfig::default(),
                openai: OpenAIConfig::default(),
                groq: GroqConfig::default(),
            },
            tutor: TutorConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.stem-tutor/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse, validate and process configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable ~ paths
        let mut config = Self::default();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        config.validate_and_process()?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path (~/.stem-tutor/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".stem-tutor").join("config.toml"))
    }

    /// Path of the SQLite knowledge store
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("knowledge.db"))
    }

    /// Validate values without touching the file system
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !VALID_STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid store backend '{}'. Must be one of: {}",
                self.store.backend,
                VALID_STORE_BACKENDS.join(", ")
            )));
        }

        if self.tutor.reference_count == 0 {
            return Err(EngineError::Config(
                "reference_count must be at least 1".to_string(),
            ));
        }

        for (name, generation) in [
            ("classifier", &self.tutor.classifier),
            ("solution", &self.tutor.solution),
            ("practice", &self.tutor.practice),
        ] {
            if !(0.0..=2.0).contains(&generation.temperature) {
                return Err(EngineError::Config(format!(
                    "tutor.{}.temperature must be between 0.0 and 2.0",
                    name
                )));
            }
            if generation.max_tokens == 0 {
                return Err(EngineError::Config(format!(
                    "tutor.{}.max_tokens must be greater than 0",
                    name
                )));
            }
        }

        let level = &self.tutor.level;
        if level.window == 0 {
            return Err(EngineError::Config(
                "tutor.level.window must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&level.retreat_below)
            || !(0.0..=1.0).contains(&level.advance_above)
            || level.retreat_below >= level.advance_above
        {
            return Err(EngineError::Config(
                "tutor.level thresholds must satisfy 0.0 <= retreat_below < advance_above <= 1.0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and process configuration
    ///
    /// Validates every section, expands ~ in paths and creates the data
    /// directory if it doesn't exist.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        self.validate()?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(path) = &self.store.path {
            self.store.path = Some(expand_path(path)?);
        }

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        self.core.data_dir = self
            .core
            .data_dir
            .canonicalize()
            .map_err(|e| EngineError::PathCanonicalization(self.core.data_dir.clone(), e.to_string()))?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.default_provider, "groq");
        assert_eq!(config.tutor.reference_count, 3);
        assert_eq!(config.tutor.classifier.temperature, 0.3);
        assert_eq!(config.tutor.classifier.max_tokens, 500);
        assert_eq!(config.tutor.solution.temperature, 0.4);
        assert_eq!(config.tutor.solution.max_tokens, 2000);
        assert_eq!(config.tutor.practice.temperature, 0.7);
        assert_eq!(config.tutor.practice.max_tokens, 1000);
        assert_eq!(config.tutor.level.window, 5);
        assert_eq!(config.store.collection_prefix, "stem_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut config = Config::default();
        config.llm.default_provider = "anthropic".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_rejects_inverted_level_thresholds() {
        let mut config = Config::default();
        config.tutor.level.retreat_below = 0.9;
        config.tutor.level.advance_above = 0.5;
        assert!(config.validate().is_err());

        config.tutor.level.retreat_below = 0.3;
        config.tutor.level.advance_above = 0.8;
        config.tutor.level.window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_generation_params() {
        let mut config = Config::default();
        config.tutor.practice.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tutor.solution.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tutor.reference_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_path_defaults_to_data_dir() {
        let mut config = Config::default();
        config.core.data_dir = PathBuf::from("/var/lib/tutor");
        assert_eq!(config.store_path(), PathBuf::from("/var/lib/tutor/knowledge.db"));

        config.store.path = Some(PathBuf::from("/tmp/problems.db"));
        assert_eq!(config.store_path(), PathBuf::from("/tmp/problems.db"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.tutor.level, deserialized.tutor.level);
        assert_eq!(config.tutor.solution, deserialized.tutor.solution);
    }
}
