//! Latency accumulators shared by the path and pid statistics.

use crate::parser::IoKind;
use serde::{Deserialize, Serialize};

/// Count, total, min, max and average of a set of nanosecond durations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStat {
    pub count: u64,
    pub total_time: u64,
    pub min_time: u64,
    pub max_time: u64,
    /// `total_time / count`, or 0 when empty
    pub average_time: u64,
}

impl LatencyStat {
    pub fn record(&mut self, time: u64) {
        if self.count == 0 {
            self.min_time = time;
            self.max_time = time;
        } else {
            self.min_time = self.min_time.min(time);
            self.max_time = self.max_time.max(time);
        }
        self.count += 1;
        self.total_time = self.total_time.saturating_add(time);
        self.average_time = self.total_time / self.count;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Separate latency accumulators for reads and writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteLatency {
    pub read: LatencyStat,
    pub write: LatencyStat,
}

impl ReadWriteLatency {
    /// Record a duration under the matching direction.
    /// Returns `false` for `IoKind::Other`, which has no accumulator.
    pub fn record(&mut self, kind: IoKind, time: u64) -> bool {
        match kind {
            IoKind::Read => self.read.record(time),
            IoKind::Write => self.write.record(time),
            IoKind::Other => return false,
        }
        true
    }
}

/// Share of `part` in `total`, as a percentage
pub fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_stat_record() {
        let mut stat = LatencyStat::default();
        for t in [30, 10, 20] {
            stat.record(t);
        }
        assert_eq!(stat.count, 3);
        assert_eq!(stat.total_time, 60);
        assert_eq!(stat.min_time, 10);
        assert_eq!(stat.max_time, 30);
        assert_eq!(stat.average_time, 20);
    }

    #[test]
    fn test_first_sample_sets_min() {
        let mut stat = LatencyStat::default();
        stat.record(500);
        assert_eq!(stat.min_time, 500);
    }

    #[test]
    fn test_read_write_split() {
        let mut rw = ReadWriteLatency::default();
        assert!(rw.record(IoKind::Read, 5));
        assert!(rw.record(IoKind::Write, 7));
        assert!(!rw.record(IoKind::Other, 9));
        assert_eq!(rw.read.count + rw.write.count, 2);
        assert_eq!(rw.write.max_time, 7);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }
}
