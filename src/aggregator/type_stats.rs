//! Read/write/other event counts over the timeline.

use super::metrics::percentage;
use super::registry::{Statistic, StatisticReport};
use crate::parser::{BlockIoEvent, IoKind};
use serde::{Deserialize, Serialize};

/// Event counts by direction, with their share of all events seen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub read_count: u64,
    pub write_count: u64,
    pub other_count: u64,
    pub total: u64,
    pub read_percentage: f64,
    pub write_percentage: f64,
    pub other_percentage: f64,
}

#[derive(Debug, Default)]
pub struct TypeStatistic {
    summary: TypeSummary,
}

impl TypeStatistic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic<BlockIoEvent> for TypeStatistic {
    fn name(&self) -> &'static str {
        "type"
    }

    fn init(&mut self) {
        self.summary = TypeSummary::default();
    }

    fn visit(&mut self, event: &BlockIoEvent) {
        match IoKind::from_category(event.category()) {
            IoKind::Read => self.summary.read_count += 1,
            IoKind::Write => self.summary.write_count += 1,
            IoKind::Other => self.summary.other_count += 1,
        }
    }

    fn finalize(&mut self, total: usize) {
        let s = &mut self.summary;
        s.total = total as u64;
        s.read_percentage = percentage(s.read_count, s.total);
        s.write_percentage = percentage(s.write_count, s.total);
        s.other_percentage = percentage(s.other_count, s.total);
    }

    fn into_report(self: Box<Self>) -> StatisticReport {
        StatisticReport::Type(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::action::{make_action, ACTION_QUEUE, CATEGORY_WRITE};

    #[test]
    fn test_empty_run_has_zero_percentages() {
        let mut stat = TypeStatistic::new();
        stat.init();
        stat.finalize(0);
        assert_eq!(stat.summary.total, 0);
        assert_eq!(stat.summary.read_percentage, 0.0);
    }

    #[test]
    fn test_counts_by_direction() {
        let mut stat = TypeStatistic::new();
        stat.init();
        let mut event = BlockIoEvent {
            sequence: 0,
            timestamp: 0,
            sector: 0,
            byte_count: 0,
            action: make_action(CATEGORY_WRITE, ACTION_QUEUE),
            pid: 0,
            device: 0,
            cpu: 0,
            error: 0,
            pdu_len: 0,
        };
        stat.visit(&event);
        event.action = make_action(0, ACTION_QUEUE);
        stat.visit(&event);
        stat.finalize(2);

        assert_eq!(stat.summary.write_count, 1);
        assert_eq!(stat.summary.other_count, 1);
        assert_eq!(stat.summary.other_percentage, 50.0);
    }
}
