use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Base URL used when neither the environment nor the config file sets one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Environment variable that overrides the configured base URL.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// api_base_url = "https://observations.example.org"
    pub api_base_url: Option<String>,
}

impl Config {
    /// Base URL to talk to: `API_BASE_URL`, then the config file, then the default.
    pub fn resolve_base_url(&self) -> String {
        self.base_url_with_override(env::var(API_BASE_URL_ENV).ok())
    }

    fn base_url_with_override(&self, env_value: Option<String>) -> String {
        let non_empty = |s: &String| !s.trim().is_empty();

        env_value
            .filter(non_empty)
            .or_else(|| self.api_base_url.clone().filter(non_empty))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string()
    }

    /// Store a base URL after checking it is an absolute http(s) URL.
    pub fn set_api_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        let parsed = Url::parse(url).with_context(|| format!("Invalid base URL '{url}'"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Base URL must use http or https, got '{}'", parsed.scheme()));
        }

        self.api_base_url = Some(url.trim_end_matches('/').to_string());
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-observations", "observations")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
