//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use netcounter_config::ConfigError;
use netcounter_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const INPUT: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Session input ────────────────────────────────────────────────
    #[error("Malformed session at line {line}: {message}")]
    #[diagnostic(
        code(netcounter::session),
        help(
            "Each non-blank line must be one JSON step, e.g.\n\
             {{\"type\":\"availability\",\"available\":true}}"
        )
    )]
    Session { line: usize, message: String },

    #[error("Could not read session from {source_name}")]
    #[diagnostic(code(netcounter::input))]
    Input {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netcounter::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(netcounter::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(netcounter::config),
        help("Check the config file and NETCOUNTER_* environment variables.")
    )]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(netcounter::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render config: {0}")]
    #[diagnostic(code(netcounter::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Session { .. } | Self::Input { .. } => exit_code::INPUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ConfigExists { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidIdentity { message } => CliError::Validation {
                field: "counter.path_prefix".into(),
                reason: message,
            },
            CoreError::Session { line, message } => CliError::Session { line, message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
