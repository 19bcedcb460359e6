//! Configuration management for vpner.
//!
//! Handles loading and saving the TOML configuration file with
//! cross-platform paths and atomic write operations. The file holds the
//! persisted service selection plus the polling/settle tuning knobs.

use crate::{
    AppError, AppResult,
    config::{BehaviourConfig, ConnectionConfig},
};

use std::{fs, io::Write, panic::Location, path::PathBuf, time::Duration};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use vpner_core::MonitorOptions;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Selected VPN service.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Polling and settle-delay settings.
    #[serde(default)]
    pub behavior: BehaviourConfig,
}

impl Config {
    /// Load configuration from disk, creating a default file if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Monitor tuning derived from the behavior section.
    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            poll_interval: Duration::from_secs(self.behavior.poll_interval_secs),
            settle_delay: Duration::from_secs(self.behavior.settle_delay_secs),
        }
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "vpner", "Vpner").ok_or_else(|| AppError::ConfigError {
                reason: "Failed to get config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }
}
