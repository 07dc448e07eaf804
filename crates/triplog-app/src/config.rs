//! Configuration management for triplog
//!
//! Config stored at: ~/.config/triplog/config.json

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use triplog_types::{ConfigError, OutputFormat, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Quiet period before a party name lookup fires
    #[serde(default = "default_debounce_ms")]
    pub suggestion_debounce_ms: u64,

    /// Maximum suggestions per field
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Times a trip commit is rebuilt after losing a create/increment race
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_conflict_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: None,
            output_format: OutputFormat::default(),
            suggestion_debounce_ms: default_debounce_ms(),
            suggestion_limit: default_suggestion_limit(),
            conflict_retries: default_conflict_retries(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("triplog");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("triplog")
            .join("store");
        Ok(store_dir)
    }

    pub fn suggestion_debounce(&self) -> Duration {
        Duration::from_millis(self.suggestion_debounce_ms)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse config JSON; missing fields take their defaults
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Triplog Configuration")?;
        writeln!(f, "=====================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Store dir:         {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:     {}", self.output_format)?;
        writeln!(f, "Suggestion delay:  {} ms", self.suggestion_debounce_ms)?;
        writeln!(f, "Suggestion limit:  {}", self.suggestion_limit)?;
        writeln!(f, "Conflict retries:  {}", self.conflict_retries)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:       {}", path.display())?;
        }

        Ok(())
    }
}
