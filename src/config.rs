//! Configuration file for learn

use crate::llm::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "learn.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnConfig {
    /// Path of the SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Heuristic card generation settings
    #[serde(default)]
    pub cards: CardSettings,

    /// LLM endpoint configuration
    #[serde(default)]
    pub llm: LlmSettings,
}

/// Heuristic card generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSettings {
    /// Paragraphs shorter than this (in characters) are skipped
    #[serde(default = "default_min_paragraph_len")]
    pub min_paragraph_len: usize,

    /// Answers are cut to this many characters
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,

    /// Maximum number of cards per ingested document
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
}

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API endpoint URL (e.g., http://localhost:11434 for Ollama)
    pub endpoint: Option<String>,

    /// Model name to use
    pub model: Option<String>,

    /// API key (if required)
    pub api_key: Option<String>,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("learn.db")
}

fn default_min_paragraph_len() -> usize {
    40
}

fn default_max_answer_len() -> usize {
    280
}

fn default_max_cards() -> usize {
    10
}

fn default_max_tokens() -> usize {
    2048
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_retries() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cards: CardSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            min_paragraph_len: default_min_paragraph_len(),
            max_answer_len: default_max_answer_len(),
            max_cards: default_max_cards(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// Client configuration, filling unset fields with client defaults
    pub fn client_config(&self) -> LlmConfig {
        let defaults = LlmConfig::default();
        LlmConfig {
            endpoint: self.endpoint.clone().unwrap_or(defaults.endpoint),
            model: self.model.clone().unwrap_or(defaults.model),
            api_key: self.api_key.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl LearnConfig {
    /// Load configuration from `path` or return defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: LearnConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
