//! Per-CPU read/write event counters over the timeline.

use super::registry::{Statistic, StatisticReport};
use crate::parser::action::is_notify;
use crate::parser::{BlockIoEvent, IoKind};
use crate::utils::config::{CPU_CHUNK, MAX_CPU};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuStat {
    pub cpu: u32,
    pub read_count: u64,
    pub write_count: u64,
}

/// Counter table indexed by CPU id, grown `CPU_CHUNK` slots at a time
#[derive(Debug, Default)]
pub struct CpuStatistic {
    table: Vec<CpuStat>,
}

impl CpuStatistic {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, cpu: u32) -> &mut CpuStat {
        let idx = cpu as usize;
        if idx >= self.table.len() {
            let new_len = (idx / CPU_CHUNK + 1) * CPU_CHUNK;
            let start = self.table.len();
            self.table.extend((start..new_len).map(|c| CpuStat {
                cpu: c as u32,
                ..CpuStat::default()
            }));
        }
        &mut self.table[idx]
    }
}

impl Statistic<BlockIoEvent> for CpuStatistic {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn init(&mut self) {
        self.table.clear();
    }

    fn visit(&mut self, event: &BlockIoEvent) {
        if event.cpu >= MAX_CPU || is_notify(event.category()) {
            return;
        }
        match IoKind::from_category(event.category()) {
            IoKind::Read => self.slot(event.cpu).read_count += 1,
            IoKind::Write => self.slot(event.cpu).write_count += 1,
            IoKind::Other => {}
        }
    }

    fn into_report(self: Box<Self>) -> StatisticReport {
        let used = self
            .table
            .into_iter()
            .filter(|c| c.read_count + c.write_count > 0)
            .collect();
        StatisticReport::Cpu(used)
    }
}
