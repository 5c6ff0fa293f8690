use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::DEFAULT_MODEL;
use crate::ai::gemini::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// API key from the environment, then the config file. Absence is not an
    /// error here; it surfaces when a turn is attempted.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn base_url_or_default(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cortex").join("config.json"))
    }
}
