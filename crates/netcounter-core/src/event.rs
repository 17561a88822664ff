// ── Counter events ──

use serde::Serialize;
use strum::IntoStaticStr;

use netcounter_api::{CounterMap, ObjectPath};

/// A change notification raised by a [`Counter`](crate::Counter).
///
/// Each variant fires exactly once per triggering change. Field events
/// carry the raw reported value, whichever bucket it landed in.
#[derive(Debug, Clone, PartialEq, Serialize, IntoStaticStr)]
#[serde(tag = "event", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[non_exhaustive]
pub enum CounterEvent {
    /// A usage report arrived, before any accounting is applied.
    UsageChanged {
        service: ObjectPath,
        counters: CounterMap,
        roaming: bool,
    },
    RoamingChanged { roaming: bool },
    BytesReceivedChanged { value: u64 },
    BytesTransmittedChanged { value: u64 },
    SecondsOnlineChanged { value: u32 },
    AccuracyChanged { value: u32 },
    IntervalChanged { value: u32 },
    RunningChanged { running: bool },
    /// The manager revoked the registration. The counter changes no
    /// state on its own; the owner decides whether to re-register.
    Released,
}

impl CounterEvent {
    /// Stable kebab-case name, e.g. `"bytes-received-changed"`.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}
