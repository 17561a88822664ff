// ── Usage payloads ──
//
// The manager reports usage as a loosely typed dictionary. Only three
// keys matter to the counter; everything else is carried along untouched
// so observers can see the full report.

use serde::Serialize;
use serde_json::Value;

/// Bytes received since registration.
pub const RX_BYTES: &str = "RX.Bytes";
/// Bytes transmitted since registration.
pub const TX_BYTES: &str = "TX.Bytes";
/// Seconds online since registration.
pub const TIME: &str = "Time";

/// Raw usage dictionary as delivered by the manager.
pub type CounterMap = serde_json::Map<String, Value>;

/// The three numbers the counter accounts for, decoded from a [`CounterMap`].
///
/// A zero field means "not reported this round", never "reset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub online_secs: u32,
}

impl UsageSample {
    /// Decode a usage dictionary.
    ///
    /// Missing keys, non-numeric values and values that overflow the
    /// field read as zero, so a malformed report simply updates nothing.
    /// Numeric strings are accepted (`"1024"`).
    pub fn from_counters(counters: &CounterMap) -> Self {
        let online_secs = u32::try_from(read_u64(counters.get(TIME))).unwrap_or(0);
        Self {
            rx_bytes: read_u64(counters.get(RX_BYTES)),
            tx_bytes: read_u64(counters.get(TX_BYTES)),
            online_secs,
        }
    }

    /// `true` when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.rx_bytes == 0 && self.tx_bytes == 0 && self.online_secs == 0
    }
}

fn read_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
