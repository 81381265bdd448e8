use super::view::{DEFAULT_SOURCE, DEFAULT_TARGET};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "EXCHANGE_RATE_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaultsConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            source: default_source(),
            target: default_target(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Loads the config at the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        self.with_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Replaces the API key when `api_key` is a non-empty value.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {}", API_KEY_ENV);
            self.provider.api_key = Some(key);
        }
        self
    }

    /// The API key as sent to the provider. A missing key is passed through
    /// as empty and every fetch will fail.
    pub fn api_key(&self) -> &str {
        self.provider.api_key.as_deref().unwrap_or_default()
    }
}
