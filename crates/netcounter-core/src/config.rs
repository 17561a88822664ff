// ── Runtime counter configuration ──
//
// Describes how a counter registers with the manager. Carries no file
// handling; `netcounter-config` builds one of these from TOML and
// environment and hands it in.

/// Default path prefix for counter identities.
pub const DEFAULT_PATH_PREFIX: &str = "/ConnectivityCounter";

/// Configuration for a single counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterConfig {
    /// Object path prefix; a random suffix is appended per counter.
    pub path_prefix: String,
    /// Reporting threshold in kilobytes.
    pub accuracy: u32,
    /// Reporting period in seconds.
    pub interval: u32,
    /// Request the counter to run as soon as the manager is available.
    pub start_running: bool,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.into(),
            accuracy: 1024,
            interval: 1,
            start_running: false,
            event_capacity: 256,
        }
    }
}
