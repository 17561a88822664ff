use thiserror::Error;

/// Top-level error type for the `netcounter-api` crate.
///
/// Covers the failure modes at the manager/transport boundary.
/// `netcounter-core` maps these into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Object paths ────────────────────────────────────────────────
    /// A string that is not a valid bus object path.
    #[error("Invalid object path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // ── Bus ─────────────────────────────────────────────────────────
    /// The transport refused to expose an object at the given path.
    #[error("Could not expose counter at {path}: {reason}")]
    Exposure { path: String, reason: String },

    // ── Recorded sessions ───────────────────────────────────────────
    /// A session line could not be decoded.
    #[error("Session line {line}: {message}")]
    Session { line: usize, message: String },
}
