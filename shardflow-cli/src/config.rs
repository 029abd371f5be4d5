//! Configuration management
//!
//! Handles storing and loading CLI configuration.
//! Config directory: ~/.shardflow/ (cross-platform)
//!
//! Config file format (~/.shardflow/config.toml):
//! ```toml
//! [log]
//! level = "info"
//! color = true
//!
//! [selection]
//! expected_replica = 1
//! random = false
//! # seed = 42
//!
//! [merkle]
//! parallel = false
//! batch = 64
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Structure of ~/.shardflow/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShardflowConfig {
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,

    /// Node selection settings
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Content root settings
    #[serde(default)]
    pub merkle: MerkleConfig,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level or `tracing` filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colorful log output
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            color: true,
        }
    }
}

fn default_log_level() -> String {
    std::env::var("SHARDFLOW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

fn default_true() -> bool {
    true
}

/// Node selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Replicas required for every segment
    #[serde(default = "default_expected_replica")]
    pub expected_replica: u32,

    /// Shuffle candidates instead of sorting them by shard size
    #[serde(default)]
    pub random: bool,

    /// Fixed shuffle seed, for reproducible selections
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            expected_replica: default_expected_replica(),
            random: false,
            seed: None,
        }
    }
}

fn default_expected_replica() -> u32 {
    std::env::var("SHARDFLOW_EXPECTED_REPLICA")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

/// Content root settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleConfig {
    /// Hash segments on the rayon pool
    #[serde(default)]
    pub parallel: bool,

    /// Segments hashed per parallel window
    #[serde(default = "default_batch")]
    pub batch: usize,
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            batch: default_batch(),
        }
    }
}

fn default_batch() -> usize {
    64
}

/// Get the config directory path (~/.shardflow/)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let config_dir = home.join(".shardflow");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .context("Failed to create config directory ~/.shardflow/")?;
    }

    Ok(config_dir)
}

/// Get the config file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Read ~/.shardflow/config.toml. A missing file yields the defaults.
pub fn read_config() -> Result<ShardflowConfig> {
    read_config_at(&config_file_path()?)
}

/// Read the config file at `path`, falling back to defaults if it does not exist
pub fn read_config_at(path: &Path) -> Result<ShardflowConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(ShardflowConfig::default());
    }

    let config = load_config_from(path)?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Load configuration, logging and ignoring an unreadable file
pub fn load_config() -> ShardflowConfig {
    read_config().unwrap_or_else(|e| {
        warn!("{:#}; using default configuration", e);
        ShardflowConfig::default()
    })
}

/// Load configuration from a specific file
pub fn load_config_from(path: &Path) -> Result<ShardflowConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Save configuration to ~/.shardflow/config.toml
pub fn save_config(config: &ShardflowConfig) -> Result<()> {
    let path = config_file_path()?;
    save_config_to(config, &path)
}

/// Save configuration to a specific file
pub fn save_config_to(config: &ShardflowConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content).context("Failed to write config file")?;
    Ok(())
}
