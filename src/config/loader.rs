//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/insightboard/config.toml)
//! 3. Project config (.insightboard/config.toml)
//! 4. Environment variables (INSIGHTBOARD_* prefix)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::{debug, info};

use super::types::Config;
use crate::types::{InsightError, Result};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults -> global -> project -> env vars.
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. INSIGHTBOARD_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("INSIGHTBOARD_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| InsightError::Config(format!("Configuration error: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| InsightError::Config(format!("Configuration error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/insightboard/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("insightboard"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".insightboard/config.toml")
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".insightboard")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the project config directory with a default config file.
    pub fn init_project() -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        }
        Ok(project_dir)
    }

    fn default_project_config() -> &'static str {
        r#"# InsightBoard Configuration
# Project settings override ~/.config/insightboard/config.toml.

version = "1.0"

[storage]
# data_dir = ".insightboard/data"

[analysis]
# Fixed seed makes trend synthesis reproducible across runs.
# seed = 42

[llm]
enabled = true
# model = "gpt-4o-mini"
# api_base = "https://api.openai.com/v1"
temperature = 0.7
max_tokens = 1024
timeout_secs = 60
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm]\nmodel = \"test-model\"\nmax_tokens = 256\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("test-model"));
        assert_eq!(config.llm.max_tokens, 256);
        // untouched defaults survive the merge
        assert_eq!(config.version, "1.0");
        assert!(config.llm.enabled);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm]\ntemperature = 9.0\n").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn test_default_project_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_project_config()).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert!(config.llm.enabled);
        assert_eq!(config.llm.timeout_secs, 60);
    }
}
