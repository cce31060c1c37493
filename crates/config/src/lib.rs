//! Configuration loading and validation for LoggerForge.
//!
//! Loads configuration from `~/.loggerforge/config.toml` with environment
//! variable overrides. Program definitions live in their own files and are
//! handled by [`program`].

pub mod program;

pub use program::{InstrumentSpec, ProgramSpec};

use loggerforge_core::{ExecutionMode, Scan};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.loggerforge/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Station line written into every program header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_prefix: Option<String>,

    /// Program options used when a program file leaves them out
    #[serde(default)]
    pub defaults: ProgramDefaults,

    /// External compile check
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Output files
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramDefaults {
    #[serde(default)]
    pub mode: ExecutionMode,

    #[serde(default)]
    pub preserve_variables: bool,

    #[serde(default)]
    pub scan: Scan,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable. The check is unavailable while unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments passed before the program file path
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File extension for written programs
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "CR1X".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.loggerforge/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `LOGGERFORGE_COMPILER`
    /// - `LOGGERFORGE_SCAN_INTERVAL`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(command) = lookup("LOGGERFORGE_COMPILER") {
            self.compiler.command = Some(command);
        }

        if let Some(interval) = lookup("LOGGERFORGE_SCAN_INTERVAL") {
            self.defaults.scan.interval = interval.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "LOGGERFORGE_SCAN_INTERVAL must be a positive integer, got '{interval}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".loggerforge")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.scan.interval == 0 {
            return Err(ConfigError::ValidationError(
                "defaults.scan.interval must be greater than 0".into(),
            ));
        }

        if self
            .station_prefix
            .as_deref()
            .is_some_and(|s| s.contains(['\n', '\r']))
        {
            return Err(ConfigError::ValidationError(
                "station_prefix must fit on one line".into(),
            ));
        }

        if self.compiler.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "compiler.command must not be empty".into(),
            ));
        }

        let ext = &self.output.extension;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::ValidationError(format!(
                "output.extension must be alphanumeric, got '{ext}'"
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            station_prefix: None,
            defaults: ProgramDefaults::default(),
            compiler: CompilerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
