//! Configuration file loading with precedence handling.

use crate::store::DEFAULT_PREFERENCE_KEY;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "THREAD_ORDER_CONFIG";
/// Environment variable overriding the preference key.
pub const PREFERENCE_KEY_ENV: &str = "THREAD_ORDER_PREFERENCE_KEY";
/// Environment variable overriding the store path.
pub const STORE_ENV: &str = "THREAD_ORDER_STORE";

const APP_DIR: &str = "thread-order";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// The preference key resolved to an empty string.
    #[error("Preference key must not be empty")]
    EmptyPreferenceKey,
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, defaults are used.
/// Corresponds to `~/.config/thread-order/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Key the order preference is stored under.
    #[serde(default)]
    pub preference_key: Option<String>,

    /// JSON file backing the preference store.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Key the order preference is stored under.
    pub preference_key: String,
    /// JSON file backing the preference store.
    pub store_path: PathBuf,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
            store_path: default_store_path(),
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Reject settings that cannot work.
    ///
    /// # Errors
    ///
    /// `ConfigError::EmptyPreferenceKey` for a blank key.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.preference_key.trim().is_empty() {
            return Err(ConfigError::EmptyPreferenceKey);
        }
        Ok(self)
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/thread-order/thread-order.log` on Linux, or the
/// platform's state directory elsewhere. Falls back to the current
/// directory.
pub fn default_log_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join(APP_DIR).join("thread-order.log"),
        None => PathBuf::from("thread-order.log"),
    }
}

/// Resolve default store path.
///
/// Returns `~/.local/share/thread-order/preferences.json` on Linux.
/// Falls back to the current directory.
pub fn default_store_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join(APP_DIR).join("preferences.json"),
        None => PathBuf::from("preferences.json"),
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/thread-order/config.toml` on Linux.
/// Returns `None` if the config directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `THREAD_ORDER_CONFIG` environment variable
/// 3. Default path `~/.config/thread-order/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    match default_config_path() {
        Some(default_path) => load_config_file(default_path),
        None => Ok(None),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `THREAD_ORDER_PREFERENCE_KEY` and `THREAD_ORDER_STORE`.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(key) = std::env::var(PREFERENCE_KEY_ENV) {
        config.preference_key = key;
    }
    if let Ok(store) = std::env::var(STORE_ENV) {
        config.store_path = PathBuf::from(store);
    }
    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        preference_key: config.preference_key.unwrap_or(defaults.preference_key),
        store_path: config.store_path.unwrap_or(defaults.store_path),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence. Only flags the user set apply.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    key_override: Option<String>,
    store_override: Option<PathBuf>,
    log_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(key) = key_override {
        config.preference_key = key;
    }
    if let Some(store) = store_override {
        config.store_path = store;
    }
    if let Some(log) = log_override {
        config.log_file_path = log;
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
