//! # Configuration Management Module
//!
//! Type-safe TOML configuration with defaults for every section, so a partial file (or
//! no `[permissions]` table at all) still yields a usable [`Config`].
//!
//! ## Configuration Structure
//!
//! - [`StorageConfig`] - where per-user book stores live
//! - [`TriggerConfig`] - tick length and spacing for running a used book
//! - [`ListingConfig`] - listing page size
//! - [`PermissionPolicy`] - default and per-user permission grants
//! - [`LoggingConfig`] - log level and optional log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use commandbooks::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Books stored under {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [trigger]
//! tick_ms = 50
//! ticks_between_commands = 2
//!
//! [listing]
//! page_size = 10
//!
//! [permissions]
//! default = ["commandbook.command.save", "commandbook.command.load.self"]
//!
//! [permissions.users]
//! admin = ["commandbook.*"]
//!
//! [logging]
//! level = "info"
//! file = "commandbooks.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::permissions::PermissionPolicy;
use crate::scheduler::SchedulerConfig;
use crate::service::DEFAULT_PAGE_SIZE;
use crate::trigger::DEFAULT_SPACING_TICKS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Upper bound for `trigger.tick_ms` (one minute).
pub const MAX_TICK_MS: u64 = 60_000;

/// Upper bound for `trigger.ticks_between_commands`.
pub const MAX_TICKS_BETWEEN_COMMANDS: u64 = 72_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Length of one scheduler tick (ms).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Ticks between two consecutive commands of a used book. Minimum 1.
    #[serde(default = "default_ticks_between")]
    pub ticks_between_commands: u64,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_ticks_between() -> u64 {
    DEFAULT_SPACING_TICKS
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            ticks_between_commands: default_ticks_between(),
        }
    }
}

impl TriggerConfig {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::from_tick_ms(self.tick_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Permission denials are copied here when set.
    pub security_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("commandbooks.log".to_string()),
            security_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub permissions: PermissionPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if !(1..=MAX_TICK_MS).contains(&self.trigger.tick_ms) {
            return Err(anyhow!("trigger.tick_ms must be between 1 and {}", MAX_TICK_MS));
        }
        if !(1..=MAX_TICKS_BETWEEN_COMMANDS).contains(&self.trigger.ticks_between_commands) {
            return Err(anyhow!(
                "trigger.ticks_between_commands must be between 1 and {}",
                MAX_TICKS_BETWEEN_COMMANDS
            ));
        }
        if self.listing.page_size == 0 {
            return Err(anyhow!("listing.page_size must be at least 1"));
        }
        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
