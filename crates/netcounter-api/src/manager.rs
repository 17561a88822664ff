// ── Connectivity manager seam ──
//
// The manager is the external service that measures traffic and calls
// back into registered counters. The counter only ever talks to it
// through this trait.

use serde::Serialize;
use tokio::sync::watch;

use crate::path::ObjectPath;

/// Client side of the connectivity manager.
///
/// Register and unregister are fire-and-forget: implementations return
/// immediately and never report a result. They must not call back into
/// the counter synchronously.
pub trait ConnectivityManager: Send + Sync {
    /// Subscribe to manager reachability. `true` means the service is
    /// on the bus and accepting calls.
    fn availability(&self) -> watch::Receiver<bool>;

    /// Whether the manager is reachable right now.
    fn is_available(&self) -> bool {
        *self.availability().borrow()
    }

    /// Ask the manager to start reporting to the counter at `path`.
    ///
    /// `accuracy` is the reporting threshold in kilobytes, `interval`
    /// the reporting period in seconds.
    fn register_counter(&self, path: &ObjectPath, accuracy: u32, interval: u32);

    /// Ask the manager to stop reporting to the counter at `path`.
    fn unregister_counter(&self, path: &ObjectPath);
}

/// An outbound manager call, as recorded by test and replay managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ManagerCall {
    Register {
        path: ObjectPath,
        accuracy: u32,
        interval: u32,
    },
    Unregister {
        path: ObjectPath,
    },
}

impl ManagerCall {
    pub fn path(&self) -> &ObjectPath {
        match self {
            Self::Register { path, .. } | Self::Unregister { path } => path,
        }
    }
}
