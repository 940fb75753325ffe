//! Sector-keyed index of request lifecycles.
//!
//! Buckets are keyed by starting sector and hold nuggets most-recent first.
//! At most one nugget per bucket is `Active`, and it is always the head.
//!
//! Back-merge lookups need the request whose *end* sector matches, which is
//! not the tree's key. A second map from end sector to active nuggets answers
//! that query directly and is kept in step with every size or status change.

use super::nugget::{Nugget, NuggetId, NuggetStatus};
use super::timeline::Timeline;
use crate::parser::action::{action_code, ACTION_BACKMERGE, ACTION_COMPLETE, ACTION_FRONTMERGE};
use crate::parser::BlockIoEvent;
use crate::utils::config::DEFAULT_MAX_PATH_LEN;
use crate::utils::error::{MergeKind, ReconstructError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Counters describing one reconstruction pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionSummary {
    /// Events recorded on a nugget's path
    pub events_applied: u64,
    pub back_merges: u64,
    pub front_merges: u64,
    pub completions: u64,
    /// Merges skipped because the counterpart request was missing
    pub inconsistencies: u64,
    /// Events rejected because the nugget's path was full
    pub path_overflows: u64,
}

#[derive(Debug)]
pub struct SectorIndex {
    arena: Vec<Nugget>,
    buckets: BTreeMap<u64, Vec<NuggetId>>,
    active_ends: BTreeMap<u64, BTreeSet<NuggetId>>,
    max_path_len: usize,
    summary: ReconstructionSummary,
}

impl Default for SectorIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATH_LEN)
    }
}

impl SectorIndex {
    pub fn new(max_path_len: usize) -> Self {
        Self {
            arena: Vec::new(),
            buckets: BTreeMap::new(),
            active_ends: BTreeMap::new(),
            max_path_len,
            summary: ReconstructionSummary::default(),
        }
    }

    /// Replay every timeline event in order.
    ///
    /// **Public** - main entry point for reconstruction
    ///
    /// # Errors
    /// Only fatal errors are returned. Missing merge counterparts are logged,
    /// counted and skipped; a full path drops only the path entry.
    pub fn replay(&mut self, timeline: &Timeline) -> Result<ReconstructionSummary, ReconstructError> {
        info!("Replaying {} events into the sector index", timeline.len());

        for event in timeline {
            match self.apply(event) {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping transition for event seq={}: {}", event.sequence, e)
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Reconstructed {} nuggets in {} buckets ({} back-merges, {} front-merges, {} inconsistencies)",
            self.nugget_count(),
            self.bucket_count(),
            self.summary.back_merges,
            self.summary.front_merges,
            self.summary.inconsistencies
        );
        Ok(self.summary.clone())
    }

    /// Return the active nugget at `sector`, creating one if the bucket has none.
    pub fn resolve_active_nugget(&mut self, sector: u64) -> Result<NuggetId, ReconstructError> {
        if let Some(head) = self.head_id(sector) {
            if self.arena[head.0].is_active() {
                return Ok(head);
            }
        }
        self.create_nugget(sector)
    }

    /// Apply one event to the active nugget at its sector.
    ///
    /// Returns the nugget the event was recorded on.
    pub fn apply(&mut self, event: &BlockIoEvent) -> Result<NuggetId, ReconstructError> {
        let id = self.resolve_active_nugget(event.sector)?;
        match self.apply_to(id, event) {
            Ok(()) => {
                self.summary.events_applied += 1;
                Ok(id)
            }
            Err(e) => {
                match &e {
                    ReconstructError::MergeTargetMissing { .. } => {
                        self.summary.events_applied += 1;
                        self.summary.inconsistencies += 1;
                    }
                    ReconstructError::PathOverflow { .. } => self.summary.path_overflows += 1,
                    ReconstructError::AllocationFailed(_) => {}
                }
                Err(e)
            }
        }
    }

    /// Record the event on `id` and run its state transition.
    ///
    /// A full path only drops the path entry; the transition and category
    /// refresh still happen so the request can complete or merge.
    fn apply_to(&mut self, id: NuggetId, event: &BlockIoEvent) -> Result<(), ReconstructError> {
        let nugget = &self.arena[id.0];
        let overflow = (nugget.path_len() >= self.max_path_len).then(|| ReconstructError::PathOverflow {
            sector: nugget.sector,
            capacity: self.max_path_len,
        });

        let first = nugget.path_len() == 0;
        self.update(id, |n| {
            if first {
                n.size = event.byte_count;
                n.pid = event.pid;
                n.category = event.category();
            }
            if overflow.is_none() {
                n.push_step(event.action_char(), event.timestamp);
            }
            n.record_cpu(event.cpu);
        });

        let transition = match action_code(event.action) {
            ACTION_BACKMERGE => self.back_merge(id),
            ACTION_FRONTMERGE => self.front_merge(id),
            ACTION_COMPLETE => {
                self.update(id, |n| n.status = NuggetStatus::Complete);
                self.summary.completions += 1;
                Ok(())
            }
            _ => Ok(()),
        };

        self.arena[id.0].category = event.category();

        match (transition, overflow) {
            (Err(e), Some(full)) => {
                // the transition error wins; count the dropped entry here
                warn!("Dropping path entry for event seq={}: {}", event.sequence, full);
                self.summary.path_overflows += 1;
                Err(e)
            }
            (Err(e), None) => Err(e),
            (Ok(()), Some(full)) => Err(full),
            (Ok(()), None) => Ok(()),
        }
    }

    /// Fold `id` into the active request that ends where it starts
    fn back_merge(&mut self, id: NuggetId) -> Result<(), ReconstructError> {
        let sector = self.arena[id.0].sector;
        let target = self
            .active_ends
            .get(&sector)
            .and_then(|ids| ids.iter().rev().find(|&&t| t != id).copied())
            .ok_or(ReconstructError::MergeTargetMissing {
                kind: MergeKind::Back,
                sector,
            })?;

        let size = self.arena[id.0].size;
        self.update(id, |n| {
            n.status = NuggetStatus::BackMerged;
            n.merged_into = Some(target);
        });
        self.update(target, |n| n.size = n.size.saturating_add(size));
        self.summary.back_merges += 1;

        debug!(
            "Back-merge: sector {} ({} bytes) into sector {}",
            sector, size, self.arena[target.0].sector
        );
        Ok(())
    }

    /// Prepend `id` to the request starting at its end sector. The absorbed
    /// request's state moves onto a fresh nugget at our sector and the
    /// absorbed nugget leaves its bucket.
    fn front_merge(&mut self, id: NuggetId) -> Result<(), ReconstructError> {
        let (sector, end, size) = {
            let n = &self.arena[id.0];
            (n.sector, n.end_sector(), n.size)
        };
        let (target_sector, absorbed) = end
            .and_then(|end| self.head_id(end).map(|head| (end, head)))
            .filter(|&(_, head)| head != id)
            .ok_or(ReconstructError::MergeTargetMissing {
                kind: MergeKind::Front,
                sector,
            })?;

        self.update(id, |n| {
            n.status = NuggetStatus::FrontMerged;
            n.merged_into = Some(absorbed);
        });

        let fresh = self.resolve_active_nugget(sector)?;
        let source = self.arena[absorbed.0].clone();
        self.update(fresh, |n| {
            n.copy_state_from(&source);
            n.size = n.size.saturating_add(size);
        });
        self.detach_head(target_sector);
        self.summary.front_merges += 1;

        debug!(
            "Front-merge: sector {} absorbed request at sector {}",
            sector, target_sector
        );
        Ok(())
    }

    fn create_nugget(&mut self, sector: u64) -> Result<NuggetId, ReconstructError> {
        self.arena.try_reserve(1)?;
        let id = NuggetId(self.arena.len());
        self.arena.push(Nugget::new(id, sector));

        let bucket = self.buckets.entry(sector).or_default();
        bucket.try_reserve(1)?;
        bucket.insert(0, id);

        self.index_end(id);
        Ok(id)
    }

    /// Remove the head nugget of a bucket. No-op on an empty or missing bucket.
    fn detach_head(&mut self, sector: u64) -> Option<NuggetId> {
        let bucket = self.buckets.get_mut(&sector)?;
        if bucket.is_empty() {
            return None;
        }
        let head = bucket.remove(0);
        if bucket.is_empty() {
            self.buckets.remove(&sector);
        }
        self.unindex_end(head);
        Some(head)
    }

    /// Mutate a nugget while keeping the end-sector index consistent
    fn update(&mut self, id: NuggetId, f: impl FnOnce(&mut Nugget)) {
        self.unindex_end(id);
        f(&mut self.arena[id.0]);
        self.index_end(id);
    }

    fn index_end(&mut self, id: NuggetId) {
        let n = &self.arena[id.0];
        if let (true, Some(end)) = (n.is_active(), n.end_sector()) {
            self.active_ends.entry(end).or_default().insert(id);
        }
    }

    fn unindex_end(&mut self, id: NuggetId) {
        let Some(end) = self.arena[id.0].end_sector() else {
            return;
        };
        if let Some(ids) = self.active_ends.get_mut(&end) {
            ids.remove(&id);
            if ids.is_empty() {
                self.active_ends.remove(&end);
            }
        }
    }

    fn head_id(&self, sector: u64) -> Option<NuggetId> {
        self.buckets.get(&sector).and_then(|b| b.first().copied())
    }

    /// Look up any nugget ever created, including absorbed ones
    pub fn nugget(&self, id: NuggetId) -> Option<&Nugget> {
        self.arena.get(id.0)
    }

    /// Nugget ids at `sector`, most recent first
    pub fn bucket(&self, sector: u64) -> Option<&[NuggetId]> {
        self.buckets.get(&sector).map(Vec::as_slice)
    }

    /// Head nugget at `sector`
    pub fn head(&self, sector: u64) -> Option<&Nugget> {
        self.head_id(sector).map(|id| &self.arena[id.0])
    }

    /// Buckets in ascending sector order
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &[NuggetId])> + '_ {
        self.buckets.iter().map(|(&s, b)| (s, b.as_slice()))
    }

    /// Every bucketed nugget: ascending sector, then bucket order
    pub fn nuggets_in_order(&self) -> impl Iterator<Item = &Nugget> + '_ {
        self.buckets
            .values()
            .flat_map(move |b| b.iter().map(move |id| &self.arena[id.0]))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Nuggets still held in a bucket
    pub fn nugget_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn summary(&self) -> &ReconstructionSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::action::{make_action, ACTION_ISSUE, ACTION_QUEUE, CATEGORY_READ, CATEGORY_WRITE};

    fn ev(sector: u64, bytes: u32, code: u32, timestamp: u64) -> BlockIoEvent {
        BlockIoEvent {
            sequence: 0,
            timestamp,
            sector,
            byte_count: bytes,
            action: make_action(CATEGORY_WRITE, code),
            pid: 42,
            device: 0,
            cpu: 1,
            error: 0,
            pdu_len: 0,
        }
    }

    fn assert_active_heads(index: &SectorIndex) {
        for (_, ids) in index.buckets() {
            for (pos, id) in ids.iter().enumerate() {
                if index.nugget(*id).unwrap().is_active() {
                    assert_eq!(pos, 0, "active nugget must be bucket head");
                }
            }
        }
    }

    #[test]
    fn test_resolve_reuses_active_head() {
        let mut index = SectorIndex::default();
        let a = index.resolve_active_nugget(10).unwrap();
        let b = index.resolve_active_nugget(10).unwrap();
        assert_eq!(a, b);
        assert_eq!(index.bucket_count(), 1);
    }

    #[test]
    fn test_complete_starts_new_nugget() {
        let mut index = SectorIndex::default();
        index.apply(&ev(10, 512, ACTION_QUEUE, 0)).unwrap();
        index.apply(&ev(10, 512, ACTION_COMPLETE, 5)).unwrap();
        let second = index.apply(&ev(10, 512, ACTION_QUEUE, 9)).unwrap();

        assert_eq!(index.bucket(10).unwrap()[0], second);
        assert_eq!(index.bucket(10).unwrap().len(), 2);
        assert_active_heads(&index);
    }

    #[test]
    fn test_first_event_sets_request_fields() {
        let mut index = SectorIndex::default();
        let mut first = ev(10, 4096, ACTION_QUEUE, 0);
        first.action = make_action(CATEGORY_READ, ACTION_QUEUE);
        let id = index.apply(&first).unwrap();
        index.apply(&ev(10, 123, ACTION_ISSUE, 3)).unwrap();

        let n = index.nugget(id).unwrap();
        assert_eq!(n.size, 4096);
        assert_eq!(n.pid, 42);
        assert_eq!(n.cpu, Some(1));
        // refreshed from the latest event
        assert_eq!(n.category, CATEGORY_WRITE);
        assert_eq!(n.path_string(), "QD");
    }

    #[test]
    fn test_back_merge_conserves_size() {
        let mut index = SectorIndex::default();
        let target = index.apply(&ev(184, 8192, ACTION_QUEUE, 0)).unwrap();
        let merged = index.apply(&ev(200, 4096, ACTION_QUEUE, 1)).unwrap();
        index.apply(&ev(200, 4096, ACTION_BACKMERGE, 2)).unwrap();

        let t = index.nugget(target).unwrap();
        let m = index.nugget(merged).unwrap();
        assert_eq!(t.size, 12288);
        assert_eq!(t.end_sector(), Some(208));
        assert_eq!(m.status, NuggetStatus::BackMerged);
        assert_eq!(m.merged_into, Some(target));
        assert_eq!(index.summary().back_merges, 1);
    }

    #[test]
    fn test_back_merge_follows_grown_end_sector() {
        let mut index = SectorIndex::default();
        let target = index.apply(&ev(0, 4096, ACTION_QUEUE, 0)).unwrap();
        index.apply(&ev(8, 4096, ACTION_BACKMERGE, 1)).unwrap();
        // target now ends at sector 16
        index.apply(&ev(16, 4096, ACTION_BACKMERGE, 2)).unwrap();
        assert_eq!(index.nugget(target).unwrap().size, 12288);
    }

    #[test]
    fn test_back_merge_without_target_is_skipped() {
        let mut index = SectorIndex::default();
        let id = index.apply(&ev(500, 4096, ACTION_QUEUE, 0)).unwrap();
        let err = index.apply(&ev(500, 4096, ACTION_BACKMERGE, 1)).unwrap_err();

        assert!(err.is_recoverable());
        let n = index.nugget(id).unwrap();
        assert_eq!(n.status, NuggetStatus::Active);
        assert_eq!(n.path_string(), "QM");
        assert_eq!(index.summary().inconsistencies, 1);
    }

    #[test]
    fn test_front_merge_moves_absorbed_state() {
        let mut index = SectorIndex::default();
        let absorbed = index.apply(&ev(108, 4096, ACTION_QUEUE, 0)).unwrap();
        index.apply(&ev(108, 4096, ACTION_ISSUE, 1)).unwrap();
        let current = index.apply(&ev(100, 4096, ACTION_QUEUE, 2)).unwrap();
        index.apply(&ev(100, 4096, ACTION_FRONTMERGE, 3)).unwrap();

        let c = index.nugget(current).unwrap();
        assert_eq!(c.status, NuggetStatus::FrontMerged);
        assert_eq!(c.merged_into, Some(absorbed));

        let fresh = index.head(100).unwrap();
        assert_ne!(fresh.id, current);
        assert!(fresh.is_active());
        assert_eq!(fresh.sector, 100);
        assert_eq!(fresh.size, 8192);
        assert_eq!(fresh.path_string(), "QD");
        assert!(index.bucket(108).is_none());
        assert_eq!(index.summary().front_merges, 1);
        assert_active_heads(&index);
    }

    #[test]
    fn test_front_merge_without_target_is_skipped() {
        let mut index = SectorIndex::default();
        let err = index.apply(&ev(100, 4096, ACTION_FRONTMERGE, 0)).unwrap_err();
        assert!(matches!(
            err,
            ReconstructError::MergeTargetMissing { kind: MergeKind::Front, sector: 100 }
        ));
        assert_eq!(index.bucket(100).unwrap().len(), 1);
        assert!(index.head(100).unwrap().is_active());
    }

    #[test]
    fn test_path_overflow_is_reported() {
        let mut index = SectorIndex::new(2);
        index.apply(&ev(1, 512, ACTION_QUEUE, 0)).unwrap();
        index.apply(&ev(1, 512, ACTION_ISSUE, 1)).unwrap();
        let err = index.apply(&ev(1, 512, ACTION_ISSUE, 2)).unwrap_err();

        assert!(matches!(err, ReconstructError::PathOverflow { capacity: 2, .. }));
        assert_eq!(index.head(1).unwrap().path_len(), 2);
        assert_eq!(index.summary().path_overflows, 1);
    }

    #[test]
    fn test_full_path_still_completes() {
        let mut index = SectorIndex::new(2);
        for (t, code) in [ACTION_QUEUE, ACTION_ISSUE, ACTION_COMPLETE, ACTION_QUEUE, ACTION_ISSUE, ACTION_COMPLETE]
            .into_iter()
            .enumerate()
        {
            let _ = index.apply(&ev(10, 512, code, t as u64));
        }

        let bucket = index.bucket(10).unwrap();
        assert_eq!(bucket.len(), 2);
        for id in bucket {
            let n = index.nugget(*id).unwrap();
            assert_eq!(n.status, NuggetStatus::Complete);
            assert_eq!(n.path_string(), "QD");
        }
        assert_eq!(index.summary().completions, 2);
        assert_eq!(index.summary().path_overflows, 2);
        assert_active_heads(&index);
    }

    #[test]
    fn test_full_path_and_missing_merge_both_counted() {
        let mut index = SectorIndex::new(1);
        index.apply(&ev(30, 512, ACTION_QUEUE, 0)).unwrap();
        let err = index.apply(&ev(30, 512, ACTION_BACKMERGE, 1)).unwrap_err();

        assert!(matches!(err, ReconstructError::MergeTargetMissing { kind: MergeKind::Back, .. }));
        assert_eq!(index.summary().path_overflows, 1);
        assert_eq!(index.summary().inconsistencies, 1);
    }

    #[test]
    fn test_request_at_last_sector_is_not_end_indexed() {
        let mut index = SectorIndex::default();
        index.apply(&ev(u64::MAX - 1, 4096, ACTION_QUEUE, 0)).unwrap();
        index.apply(&ev(u64::MAX - 1, 4096, ACTION_ISSUE, 1)).unwrap();
        let err = index.apply(&ev(u64::MAX - 1, 4096, ACTION_FRONTMERGE, 2)).unwrap_err();

        assert!(matches!(err, ReconstructError::MergeTargetMissing { kind: MergeKind::Front, .. }));
        assert!(index.active_ends.is_empty());
        assert_eq!(index.head(u64::MAX - 1).unwrap().path_string(), "QDF");
    }

    #[test]
    fn test_traversal_is_sector_ordered() {
        let mut index = SectorIndex::default();
        for sector in [300, 100, 200] {
            index.apply(&ev(sector, 512, ACTION_QUEUE, 0)).unwrap();
        }
        let sectors: Vec<u64> = index.nuggets_in_order().map(|n| n.sector).collect();
        assert_eq!(sectors, vec![100, 200, 300]);
    }
}
