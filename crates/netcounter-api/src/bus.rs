// ── Transport seam ──

use crate::error::Error;
use crate::path::ObjectPath;

/// The transport the manager uses to reach the counter.
///
/// A counter is exposed at its identity path so the manager can deliver
/// `Usage` and `Release` calls to it.
pub trait CounterBus: Send + Sync {
    /// Make the counter reachable at `path`.
    ///
    /// Idempotent: exposing an already exposed path succeeds without
    /// creating a second object. Fails if the transport refuses the path.
    fn expose(&self, path: &ObjectPath) -> Result<(), Error>;

    /// Stop routing calls for `path`. Unknown paths are ignored.
    fn withdraw(&self, path: &ObjectPath);
}
