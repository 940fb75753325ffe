//! Time-ordered store of accepted trace events.
//!
//! Captures are nearly time-ordered already, so insertion scans backward
//! from the newest entry instead of binary searching. That is close to O(1)
//! per event on real traces and O(n) on adversarial input.

use crate::parser::action::is_notify;
use crate::parser::BlockIoEvent;
use log::debug;
use serde::{Deserialize, Serialize};

/// Bounds an event must fall inside to be ingested. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFilter {
    pub time_start: u64,
    pub time_end: u64,
    pub sector_start: u64,
    pub sector_end: u64,
    pub pid: Option<u32>,
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self {
            time_start: 0,
            time_end: u64::MAX,
            sector_start: 0,
            sector_end: u64::MAX,
            pid: None,
        }
    }
}

impl TraceFilter {
    pub fn with_time(mut self, start: u64, end: u64) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    pub fn with_sectors(mut self, start: u64, end: u64) -> Self {
        self.sector_start = start;
        self.sector_end = end;
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Whether an event passes every configured bound.
    /// Notification records carry no I/O and never pass.
    pub fn admits(&self, event: &BlockIoEvent) -> bool {
        (self.time_start..=self.time_end).contains(&event.timestamp)
            && (self.sector_start..=self.sector_end).contains(&event.sector)
            && self.pid.map_or(true, |pid| pid == event.pid)
            && !is_notify(event.category())
    }
}

/// Accepted events in ascending timestamp order; ties keep insertion order.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<BlockIoEvent>,
    filter: TraceFilter,
    dropped: usize,
}

impl Timeline {
    pub fn new(filter: TraceFilter) -> Self {
        Self {
            entries: Vec::new(),
            filter,
            dropped: 0,
        }
    }

    /// Insert an event at its time-ordered position.
    ///
    /// Returns `false` if the filter rejected it.
    pub fn ingest(&mut self, event: BlockIoEvent) -> bool {
        if !self.filter.admits(&event) {
            self.dropped += 1;
            return false;
        }

        let pos = self
            .entries
            .iter()
            .rposition(|e| e.timestamp <= event.timestamp)
            .map_or(0, |i| i + 1);

        if pos != self.entries.len() {
            debug!(
                "Out-of-order event seq={} t={} placed {} entries back",
                event.sequence,
                event.timestamp,
                self.entries.len() - pos
            );
        }
        self.entries.insert(pos, event);
        true
    }

    /// Ingest every event from an iterator, returning how many were accepted
    pub fn ingest_all(&mut self, events: impl IntoIterator<Item = BlockIoEvent>) -> usize {
        events.into_iter().filter(|e| self.ingest(*e)).count()
    }

    /// Events in ascending timestamp order
    pub fn iter(&self) -> std::slice::Iter<'_, BlockIoEvent> {
        self.entries.iter()
    }

    pub fn for_each(&self, mut visitor: impl FnMut(&BlockIoEvent)) {
        for event in &self.entries {
            visitor(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events rejected by the filter
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn filter(&self) -> &TraceFilter {
        &self.filter
    }

    /// Timestamp of the earliest stored event
    pub fn first_timestamp(&self) -> Option<u64> {
        self.entries.first().map(|e| e.timestamp)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a BlockIoEvent;
    type IntoIter = std::slice::Iter<'a, BlockIoEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
