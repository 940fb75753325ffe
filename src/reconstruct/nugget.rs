//! Lifecycle record of one logical I/O request.

use crate::parser::IoKind;
use crate::utils::config::{MAX_CPU, SECTOR_SIZE};
use serde::{Deserialize, Serialize};

/// Stable handle into the sector index's nugget arena.
///
/// Used for merge links so a merged-from nugget never owns its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NuggetId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NuggetStatus {
    Active,
    BackMerged,
    FrontMerged,
    Complete,
}

/// One `(action, timestamp)` step of a nugget's path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub action: char,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nugget {
    pub id: NuggetId,
    /// Starting sector, fixed at creation
    pub sector: u64,
    /// Bytes; grows through merges
    pub size: u32,
    pub pid: u32,
    /// Category bitmask of the latest applied event
    pub category: u32,
    pub cpu: Option<u32>,
    pub status: NuggetStatus,
    pub merged_into: Option<NuggetId>,
    path: Vec<PathStep>,
}

impl Nugget {
    pub(crate) fn new(id: NuggetId, sector: u64) -> Self {
        Self {
            id,
            sector,
            size: 0,
            pid: 0,
            category: 0,
            cpu: None,
            status: NuggetStatus::Active,
            merged_into: None,
            path: Vec::new(),
        }
    }

    /// Copy another nugget's request state onto this one, keeping our
    /// identity, sector, status and merge link
    pub(crate) fn copy_state_from(&mut self, other: &Nugget) {
        self.size = other.size;
        self.pid = other.pid;
        self.category = other.category;
        self.cpu = other.cpu;
        self.path = other.path.clone();
    }

    pub(crate) fn push_step(&mut self, action: char, timestamp: u64) {
        self.path.push(PathStep { action, timestamp });
    }

    pub(crate) fn record_cpu(&mut self, cpu: u32) {
        if cpu < MAX_CPU {
            self.cpu = Some(cpu);
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == NuggetStatus::Active
    }

    /// First sector past the end of the request, `None` when it would
    /// not fit in a `u64`
    pub fn end_sector(&self) -> Option<u64> {
        self.sector.checked_add(u64::from(self.size) / SECTOR_SIZE)
    }

    pub fn io_kind(&self) -> IoKind {
        IoKind::from_category(self.category)
    }

    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    /// Number of events applied so far
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Action characters joined, e.g. `"QGIDC"`
    pub fn path_string(&self) -> String {
        self.path.iter().map(|s| s.action).collect()
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.path.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.path.last().map(|s| s.timestamp)
    }

    /// Time from first to last recorded action
    pub fn duration(&self) -> u64 {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        }
    }

    /// Durations between consecutive path steps
    pub fn step_durations(&self) -> impl Iterator<Item = u64> + '_ {
        self.path
            .windows(2)
            .map(|w| w[1].timestamp.saturating_sub(w[0].timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_durations() {
        let mut n = Nugget::new(NuggetId(0), 100);
        n.push_step('Q', 10);
        n.push_step('D', 15);
        n.push_step('C', 40);

        assert_eq!(n.path_string(), "QDC");
        assert_eq!(n.duration(), 30);
        assert_eq!(n.step_durations().collect::<Vec<_>>(), vec![5, 25]);
    }

    #[test]
    fn test_end_sector() {
        let mut n = Nugget::new(NuggetId(0), 1000);
        n.size = 8192;
        assert_eq!(n.end_sector(), Some(1016));
        n.size = 100;
        assert_eq!(n.end_sector(), Some(1000));

        let mut last = Nugget::new(NuggetId(1), u64::MAX - 1);
        last.size = 4096;
        assert_eq!(last.end_sector(), None);
    }

    #[test]
    fn test_cpu_out_of_range_ignored() {
        let mut n = Nugget::new(NuggetId(0), 0);
        n.record_cpu(MAX_CPU);
        assert_eq!(n.cpu, None);
        n.record_cpu(3);
        assert_eq!(n.cpu, Some(3));
    }

    #[test]
    fn test_copy_state_keeps_identity() {
        let mut src = Nugget::new(NuggetId(1), 64);
        src.size = 4096;
        src.pid = 9;
        src.push_step('Q', 1);
        let mut dst = Nugget::new(NuggetId(2), 56);
        dst.copy_state_from(&src);

        assert_eq!(dst.id, NuggetId(2));
        assert_eq!(dst.sector, 56);
        assert_eq!(dst.size, 4096);
        assert_eq!(dst.path_string(), "Q");
    }
}
