//! Configuration for an emulation session.
//!
//! This module defines the session parameters. It provides:
//! 1. **Defaults:** The reference layout (base `0x400000`, 128 MiB binary, 64 MiB stack).
//! 2. **Structures:** General, memory-layout and dump settings.
//! 3. **Loading:** JSON deserialisation; every field may be omitted.
//!
//! The CLI reads an optional JSON file and otherwise uses `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::constants;

/// Default configuration values.
mod defaults {
    use super::constants;

    /// Base address of the first region.
    pub const BASE: u64 = constants::DEFAULT_BASE;

    /// Binary image region size (128 MiB). Generous so images never need a second region.
    pub const BIN_SIZE: u64 = constants::BIN_SIZE;

    /// Stack region size (64 MiB).
    pub const STACK_SIZE: u64 = constants::STACK_SIZE;

    /// Dump root, relative to the working directory.
    pub const DUMP_ROOT: &str = constants::DUMP_DIR;
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config {}: {source}", path.display())]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use armemu_core::config::Config;
///
/// let config = Config::from_json(r#"{ "memory": { "stack_size": 1048576 } }"#).unwrap();
/// assert_eq!(config.memory.base, 0x40_0000);
/// assert_eq!(config.memory.stack_size, 1024 * 1024);
/// assert!(config.dump.enabled);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Address-space layout.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Region dump settings.
    #[serde(default)]
    pub dump: DumpConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] if the text is not valid configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Json`] if it is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// General settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Log every executed instruction at trace level.
    #[serde(default)]
    pub trace_instructions: bool,
}

/// Address-space layout of a session.
///
/// The binary region is allocated first at `base`, the stack region right after it.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Base address of the first region.
    #[serde(default = "MemoryConfig::default_base")]
    pub base: u64,

    /// Size of the binary image region in bytes.
    #[serde(default = "MemoryConfig::default_bin_size")]
    pub bin_size: u64,

    /// Size of the stack region in bytes.
    #[serde(default = "MemoryConfig::default_stack_size")]
    pub stack_size: u64,
}

impl MemoryConfig {
    fn default_base() -> u64 {
        defaults::BASE
    }

    fn default_bin_size() -> u64 {
        defaults::BIN_SIZE
    }

    fn default_stack_size() -> u64 {
        defaults::STACK_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base: defaults::BASE,
            bin_size: defaults::BIN_SIZE,
            stack_size: defaults::STACK_SIZE,
        }
    }
}

/// Region dump settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DumpConfig {
    /// Directory under which timestamped dump directories are created.
    #[serde(default = "DumpConfig::default_root")]
    pub root: PathBuf,

    /// Dump all regions when a run completes normally.
    #[serde(default = "DumpConfig::default_enabled")]
    pub enabled: bool,
}

impl DumpConfig {
    fn default_root() -> PathBuf {
        PathBuf::from(defaults::DUMP_ROOT)
    }

    fn default_enabled() -> bool {
        true
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            enabled: true,
        }
    }
}
