// ── Core error types ──
//
// Errors that can leave `netcounter-core`. The counter's setters and
// accessors never fail; these only surface from construction and
// session parsing.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Identity ─────────────────────────────────────────────────────
    #[error("Invalid counter identity: {message}")]
    InvalidIdentity { message: String },

    // ── Sessions ─────────────────────────────────────────────────────
    #[error("Malformed session at line {line}: {message}")]
    Session { line: usize, message: String },
}

// ── Conversion from boundary errors ──────────────────────────────────

impl From<netcounter_api::Error> for CoreError {
    fn from(err: netcounter_api::Error) -> Self {
        match err {
            netcounter_api::Error::InvalidPath { path, reason } => CoreError::InvalidIdentity {
                message: format!("'{path}' {reason}"),
            },
            // The identity exists but the transport will not host it.
            netcounter_api::Error::Exposure { path, reason } => CoreError::InvalidIdentity {
                message: format!("'{path}' refused by transport: {reason}"),
            },
            netcounter_api::Error::Session { line, message } => {
                CoreError::Session { line, message }
            }
        }
    }
}
