//! Configuration for the netcounter binary.
//!
//! Layered loading (built-in defaults, TOML file, `NETCOUNTER_` environment),
//! validation, and translation to the runtime `netcounter_core::CounterConfig`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netcounter_core::{CounterConfig, ObjectPath, config::DEFAULT_PATH_PREFIX};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `NETCOUNTER_COUNTER__ACCURACY=2048`.
pub const ENV_PREFIX: &str = "NETCOUNTER_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,
    /// How counters register with the manager.
    #[serde(default)]
    pub counter: CounterSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}

fn default_color() -> String {
    "auto".into()
}

/// The `[counter]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CounterSection {
    /// Reporting threshold in kilobytes.
    #[serde(default = "default_accuracy")]
    pub accuracy: u32,
    /// Reporting period in seconds.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Request the counter to run once the manager is available.
    #[serde(default)]
    pub running: bool,
    /// Object path prefix for counter identities.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Event channel capacity.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for CounterSection {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            interval: default_interval(),
            running: false,
            path_prefix: default_path_prefix(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_accuracy() -> u32 {
    CounterConfig::default().accuracy
}

fn default_interval() -> u32 {
    CounterConfig::default().interval
}

fn default_path_prefix() -> String {
    DEFAULT_PATH_PREFIX.into()
}

fn default_event_capacity() -> usize {
    CounterConfig::default().event_capacity
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "netcounter", "netcounter").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netcounter");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment and validate it.
///
/// `path` overrides the platform config location. A missing file is not
/// an error; defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if loading or validation fails.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    load_config(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it, creating parent directories.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Validation / translation ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.counter.path_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::Validation {
                field: "counter.path_prefix".into(),
                reason: "must not be empty".into(),
            });
        }
        ObjectPath::parse(prefix.as_str()).map_err(|e| ConfigError::Validation {
            field: "counter.path_prefix".into(),
            reason: e.to_string(),
        })?;

        if self.counter.event_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "counter.event_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Runtime counter settings described by the `[counter]` section.
    pub fn counter_config(&self) -> Result<CounterConfig, ConfigError> {
        self.validate()?;
        Ok(CounterConfig {
            path_prefix: self.counter.path_prefix.clone(),
            accuracy: self.counter.accuracy,
            interval: self.counter.interval,
            start_running: self.counter.running,
            event_capacity: self.counter.event_capacity,
        })
    }
}
