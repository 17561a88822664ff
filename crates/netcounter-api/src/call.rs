// ── Inbound calls ──
//
// What the manager side can deliver to a counter. A `Usage` call carries
// a home and a roaming dictionary at once; the counter consumes them as
// separate single-context reports.

use serde::Serialize;

use crate::path::ObjectPath;
use crate::usage::CounterMap;

/// A call delivered to the counter by the manager or its transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCall {
    /// Usage for `service`, split by network context. Either map may be empty.
    Usage {
        service: ObjectPath,
        home: CounterMap,
        roaming: CounterMap,
    },
    /// The manager is revoking the counter's registration.
    Release,
    /// The manager appeared on or vanished from the bus.
    AvailabilityChanged(bool),
}

/// One usage report for a single network context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub service: ObjectPath,
    pub counters: CounterMap,
    pub roaming: bool,
}

impl InboundCall {
    /// Split a `Usage` call into its non-empty reports, home first.
    ///
    /// Returns nothing for other calls and for a `Usage` call whose maps
    /// are both empty.
    pub fn usage_reports(self) -> Vec<UsageReport> {
        let Self::Usage {
            service,
            home,
            roaming,
        } = self
        else {
            return Vec::new();
        };

        let mut reports = Vec::with_capacity(2);
        if !home.is_empty() {
            reports.push(UsageReport {
                service: service.clone(),
                counters: home,
                roaming: false,
            });
        }
        if !roaming.is_empty() {
            reports.push(UsageReport {
                service,
                counters: roaming,
                roaming: true,
            });
        }
        reports
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> ObjectPath {
        ObjectPath::parse("/net/connman/service/cellular_1").unwrap()
    }

    fn map(v: serde_json::Value) -> CounterMap {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn usage_with_both_maps_yields_home_then_roaming() {
        let call = InboundCall::Usage {
            service: service(),
            home: map(json!({ "RX.Bytes": 1 })),
            roaming: map(json!({ "TX.Bytes": 2 })),
        };
        let reports = call.usage_reports();
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].roaming);
        assert_eq!(reports[0].counters["RX.Bytes"], 1);
        assert!(reports[1].roaming);
        assert_eq!(reports[1].counters["TX.Bytes"], 2);
    }

    #[test]
    fn empty_maps_are_skipped() {
        let call = InboundCall::Usage {
            service: service(),
            home: CounterMap::new(),
            roaming: map(json!({ "Time": 3 })),
        };
        let reports = call.usage_reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].roaming);
    }

    #[test]
    fn usage_with_no_payload_yields_nothing() {
        let call = InboundCall::Usage {
            service: service(),
            home: CounterMap::new(),
            roaming: CounterMap::new(),
        };
        assert!(call.usage_reports().is_empty());
    }

    #[test]
    fn non_usage_calls_yield_nothing() {
        assert!(InboundCall::Release.usage_reports().is_empty());
        assert!(InboundCall::AvailabilityChanged(true).usage_reports().is_empty());
    }
}
