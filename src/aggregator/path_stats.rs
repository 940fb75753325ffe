//! Latency statistics grouped by request path.
//!
//! A path is the string of action characters a nugget went through, e.g.
//! `"QGIDC"`. For every distinct path we accumulate the whole-request
//! latency (first to last action) and the latency of each adjacent
//! transition, split by read and write.

use super::metrics::ReadWriteLatency;
use super::registry::{Statistic, StatisticReport};
use crate::reconstruct::Nugget;
use crate::utils::config::EXCLUDED_PATH_MARKERS;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStat {
    pub path: String,
    /// Nuggets that followed this path, whatever their direction
    pub nugget_count: u64,
    /// First-to-last action latency
    pub latency: ReadWriteLatency,
    /// `transitions[i]` covers the step from `path[i]` to `path[i + 1]`
    pub transitions: Vec<ReadWriteLatency>,
}

impl PathStat {
    fn new(path: String) -> Self {
        let steps = path.chars().count();
        Self {
            path,
            transitions: vec![ReadWriteLatency::default(); steps.saturating_sub(1)],
            ..Self::default()
        }
    }

    /// Label of transition `i`, e.g. `"Q>G"`
    pub fn transition_label(&self, i: usize) -> Option<String> {
        let mut chars = self.path.chars().skip(i);
        let from = chars.next()?;
        let to = chars.next()?;
        Some(format!("{}>{}", from, to))
    }
}

/// Whether a path carries a plug, unplug or unknown marker
pub fn is_excluded_path(path: &str) -> bool {
    path.contains(EXCLUDED_PATH_MARKERS)
}

#[derive(Debug, Default)]
pub struct PathStatistic {
    paths: BTreeMap<String, PathStat>,
}

impl PathStatistic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistic<Nugget> for PathStatistic {
    fn name(&self) -> &'static str {
        "path"
    }

    fn init(&mut self) {
        self.paths.clear();
    }

    fn visit(&mut self, nugget: &Nugget) {
        if nugget.path_len() == 0 {
            return;
        }
        let key = nugget.path_string();
        let stat = self
            .paths
            .entry(key)
            .or_insert_with_key(|k| PathStat::new(k.clone()));

        stat.nugget_count += 1;
        let kind = nugget.io_kind();
        stat.latency.record(kind, nugget.duration());
        for (slot, time) in stat.transitions.iter_mut().zip(nugget.step_durations()) {
            slot.record(kind, time);
        }
    }

    fn finalize(&mut self, total: usize) {
        let before = self.paths.len();
        self.paths.retain(|path, _| !is_excluded_path(path));
        debug!(
            "Path statistic: {} nuggets, {} distinct paths, {} excluded",
            total,
            before,
            before - self.paths.len()
        );
    }

    fn into_report(self: Box<Self>) -> StatisticReport {
        StatisticReport::Path(self.paths.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::action::{make_action, CATEGORY_READ, CATEGORY_WRITE};
    use crate::parser::BlockIoEvent;
    use crate::reconstruct::SectorIndex;

    fn replay(index: &mut SectorIndex, sector: u64, category: u32, steps: &[(u32, u64)]) {
        for &(code, timestamp) in steps {
            index
                .apply(&BlockIoEvent {
                    sequence: 0,
                    timestamp,
                    sector,
                    byte_count: 4096,
                    action: make_action(category, code),
                    pid: 1,
                    device: 0,
                    cpu: 0,
                    error: 0,
                    pdu_len: 0,
                })
                .unwrap();
        }
    }

    fn run(index: &SectorIndex) -> Vec<PathStat> {
        let mut stat = Box::new(PathStatistic::new());
        stat.init();
        let mut total = 0;
        for n in index.nuggets_in_order() {
            stat.visit(n);
            total += 1;
        }
        stat.finalize(total);
        match stat.into_report() {
            StatisticReport::Path(paths) => paths,
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_groups_by_path() {
        let mut index = SectorIndex::default();
        // Q=1, D=7, C=8
        replay(&mut index, 0, CATEGORY_READ, &[(1, 0), (7, 10), (8, 30)]);
        replay(&mut index, 100, CATEGORY_READ, &[(1, 0), (7, 20), (8, 50)]);
        replay(&mut index, 200, CATEGORY_WRITE, &[(1, 0), (7, 5), (8, 6)]);

        let paths = run(&index);
        assert_eq!(paths.len(), 1);
        let qdc = &paths[0];
        assert_eq!(qdc.path, "QDC");
        assert_eq!(qdc.nugget_count, 3);
        assert_eq!(qdc.latency.read.count, 2);
        assert_eq!(qdc.latency.read.total_time, 80);
        assert_eq!(qdc.latency.read.min_time, 30);
        assert_eq!(qdc.latency.write.max_time, 6);
        assert_eq!(qdc.transitions.len(), 2);
        assert_eq!(qdc.transitions[0].read.total_time, 30);
        assert_eq!(qdc.transitions[1].read.total_time, 50);
        assert_eq!(qdc.transition_label(1).as_deref(), Some("D>C"));
    }

    #[test]
    fn test_excluded_paths_are_dropped() {
        let mut index = SectorIndex::default();
        // P=9, U=10
        replay(&mut index, 0, CATEGORY_READ, &[(1, 0), (9, 1), (10, 2), (8, 3)]);
        replay(&mut index, 64, CATEGORY_READ, &[(1, 0), (0x30, 1), (8, 3)]);
        replay(&mut index, 128, CATEGORY_READ, &[(1, 0), (8, 3)]);

        let paths = run(&index);
        let names: Vec<&str> = paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, vec!["QC"]);
    }

    #[test]
    fn test_is_excluded_path() {
        assert!(is_excluded_path("QPUDC"));
        assert!(is_excluded_path("Q?C"));
        assert!(!is_excluded_path("QGIDC"));
    }
}
