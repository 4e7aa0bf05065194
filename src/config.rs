//! Configuration management for the engine
//!
//! This module handles loading, parsing, and validation of configuration
//! files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_GENERATED, DEFAULT_ALLOCATED_HOURS_DEBOUNCE_MS, DEFAULT_DESCRIPTION_DEBOUNCE_MS, DEFAULT_NAME_DEBOUNCE_MS,
    MAX_DEBOUNCE_MS,
};
use crate::entities::SortKey;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub commit: CommitConfig,
    pub listing: ListingConfig,
    pub logging: LoggingConfig,
}

/// Commit debounce configuration
///
/// Structural fields (frequency, dates, assignees, project, status,
/// priority) always commit immediately and are not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Debounce delay for name edits, in milliseconds
    pub name_ms: u64,
    /// Debounce delay for description edits, in milliseconds
    pub description_ms: u64,
    /// Debounce delay for allocated-hours edits, in milliseconds
    pub allocated_hours_ms: u64,
}

/// Listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Default ordering for task listings
    /// Options: "start_date", "end_date", "frequency"
    pub default_sort: SortKey,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging to file
    pub enabled: bool,
    /// Log file path; defaults to the config directory when unset
    pub file: Option<PathBuf>,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            name_ms: DEFAULT_NAME_DEBOUNCE_MS,
            description_ms: DEFAULT_DESCRIPTION_DEBOUNCE_MS,
            allocated_hours_ms: DEFAULT_ALLOCATED_HOURS_DEBOUNCE_MS,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::StartDate,
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("recurrist.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("recurrist").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name_ms", self.commit.name_ms),
            ("description_ms", self.commit.description_ms),
            ("allocated_hours_ms", self.commit.allocated_hours_ms),
        ] {
            if value > MAX_DEBOUNCE_MS {
                anyhow::bail!("commit.{} cannot exceed {} ms, got {}", field, MAX_DEBOUNCE_MS, value);
            }
        }

        if let Some(file) = &self.logging.file {
            if file.as_os_str().is_empty() {
                anyhow::bail!("logging.file cannot be empty when set");
            }
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Recurrist Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format(crate::utils::datetime::DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        log::info!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("recurrist"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
