// ── Accounting buckets ──

use serde::{Deserialize, Serialize};

use netcounter_api::UsageSample;

/// Last reported usage for one network context (home or roaming).
///
/// Fields are snapshots of the manager's running totals, not deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBucket {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub seconds_online: u32,
}

impl UsageBucket {
    /// Overwrite every field the sample reports. Zero fields are
    /// "not reported" and leave the bucket alone.
    ///
    /// Returns `true` if any field changed.
    pub fn absorb(&mut self, sample: UsageSample) -> bool {
        let before = *self;
        if sample.rx_bytes != 0 {
            self.bytes_in = sample.rx_bytes;
        }
        if sample.tx_bytes != 0 {
            self.bytes_out = sample.tx_bytes;
        }
        if sample.online_secs != 0 {
            self.seconds_online = sample.online_secs;
        }
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rx_bytes: u64, tx_bytes: u64, online_secs: u32) -> UsageSample {
        UsageSample {
            rx_bytes,
            tx_bytes,
            online_secs,
        }
    }

    #[test]
    fn absorb_overwrites_non_zero_fields() {
        let mut bucket = UsageBucket::default();
        assert!(bucket.absorb(sample(100, 0, 30)));
        assert_eq!(bucket.bytes_in, 100);
        assert_eq!(bucket.bytes_out, 0);
        assert_eq!(bucket.seconds_online, 30);
    }

    #[test]
    fn zero_fields_never_reset() {
        let mut bucket = UsageBucket {
            bytes_in: 100,
            bytes_out: 50,
            seconds_online: 30,
        };
        assert!(!bucket.absorb(sample(0, 0, 0)));
        assert_eq!(
            bucket,
            UsageBucket {
                bytes_in: 100,
                bytes_out: 50,
                seconds_online: 30,
            }
        );
    }

    #[test]
    fn lower_non_zero_value_still_overwrites() {
        // Buckets mirror the last report, even a lower one.
        let mut bucket = UsageBucket {
            bytes_in: 5000,
            ..UsageBucket::default()
        };
        bucket.absorb(sample(10, 0, 0));
        assert_eq!(bucket.bytes_in, 10);
    }

    #[test]
    fn same_value_reports_no_change() {
        let mut bucket = UsageBucket::default();
        bucket.absorb(sample(7, 7, 7));
        assert!(!bucket.absorb(sample(7, 0, 7)));
    }
}
