//! Latency statistics grouped by issuing process.

use super::metrics::ReadWriteLatency;
use super::registry::{Statistic, StatisticReport};
use crate::reconstruct::Nugget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidStat {
    pub pid: u32,
    pub nugget_count: u64,
    pub latency: ReadWriteLatency,
}

#[derive(Debug, Default)]
pub struct PidStatistic {
    pids: BTreeMap<u32, PidStat>,
}

impl PidStatistic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic<Nugget> for PidStatistic {
    fn name(&self) -> &'static str {
        "pid"
    }

    fn init(&mut self) {
        self.pids.clear();
    }

    fn visit(&mut self, nugget: &Nugget) {
        if nugget.path_len() == 0 {
            return;
        }
        let stat = self.pids.entry(nugget.pid).or_insert_with(|| PidStat {
            pid: nugget.pid,
            ..PidStat::default()
        });
        stat.nugget_count += 1;
        stat.latency.record(nugget.io_kind(), nugget.duration());
    }

    fn into_report(self: Box<Self>) -> StatisticReport {
        StatisticReport::Pid(self.pids.into_values().collect())
    }
}
