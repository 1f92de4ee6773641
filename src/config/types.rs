//! Configuration Types
//!
//! All configuration structures with sensible defaults. Values resolve in
//! layers: built-in defaults, the global config, the project config, then
//! environment variables.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::ai::ProviderConfig;
use crate::types::{InsightError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Record and blob storage settings
    pub storage: StorageConfig,

    /// Analysis pipeline settings
    pub analysis: AnalysisConfig,

    /// Chat completion provider settings
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(InsightError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(InsightError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(InsightError::Config(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory. Defaults to the platform data dir
    /// (e.g. ~/.local/share/insightboard).
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        ProjectDirs::from("", "", "insightboard")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".insightboard/data"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolved_data_dir().join("records.db")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("blobs")
    }
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fixed RNG seed for the trend synthesizer and fallback generator.
    /// Unset means a fresh seed per run.
    pub seed: Option<u64>,
}

// =============================================================================
// LLM
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Disable to run without any completion provider; chat then always
    /// answers with its fallback reply.
    pub enabled: bool,
    pub api_base: Option<String>,
    pub model: Option<String>,
    /// Prefer the OPENAI_API_KEY environment variable over writing a key here.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: None,
            model: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }
}
