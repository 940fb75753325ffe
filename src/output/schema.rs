//! Output JSON schema definitions for analysis reports.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::{CpuStat, PathStat, PidStat, StatisticReport, TypeSummary};
use crate::reconstruct::{NuggetStatus, ReconstructionSummary, SectorIndex, Timeline, TraceFilter};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace file that was analyzed
    pub trace_file: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Records decoded from the trace
    pub events_read: u64,

    /// Records that passed the filter
    pub events_ingested: u64,

    /// Records rejected by the filter
    pub events_filtered: u64,

    /// Filter the run was made with
    pub filter: TraceFilter,

    /// Timestamp of the earliest ingested event (ns)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<u64>,

    pub reconstruction: ReconstructionSummary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_stats: Option<TypeSummary>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_stats: Vec<PathStat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pid_stats: Vec<PidStat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpu_stats: Vec<CpuStat>,

    /// Raw per-event listing (print mode `events`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventRecord>>,

    /// Raw per-nugget listing (print mode `nuggets`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuggets: Option<Vec<NuggetRecord>>,
}

impl AnalysisReport {
    /// Empty report for a trace file; statistics are filled in afterwards
    pub fn new(trace_file: impl Into<String>, filter: TraceFilter) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            trace_file: trace_file.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            events_read: 0,
            events_ingested: 0,
            events_filtered: 0,
            filter,
            first_timestamp: None,
            reconstruction: ReconstructionSummary::default(),
            type_stats: None,
            path_stats: Vec::new(),
            pid_stats: Vec::new(),
            cpu_stats: Vec::new(),
            events: None,
            nuggets: None,
        }
    }

    /// Move finalized statistics into their report sections
    pub fn absorb_statistics(&mut self, reports: Vec<StatisticReport>) {
        for report in reports {
            match report {
                StatisticReport::Type(summary) => self.type_stats = Some(summary),
                StatisticReport::Path(paths) => self.path_stats = paths,
                StatisticReport::Pid(pids) => self.pid_stats = pids,
                StatisticReport::Cpu(cpus) => self.cpu_stats = cpus,
            }
        }
    }
}

/// One row of the raw event listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u32,
    pub timestamp: u64,
    pub sector: u64,
    pub pid: u32,
    pub byte_count: u32,
    pub action: char,
}

/// One row of the raw nugget listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NuggetRecord {
    pub sector: u64,
    /// Timestamp of the nugget's first action (ns)
    pub timestamp: u64,
    pub pid: u32,
    pub size: u32,
    pub path: String,
    pub status: NuggetStatus,
    /// Starting sector of the request this one was merged into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<u64>,
}

/// Every timeline event, in time order
pub fn event_listing(timeline: &Timeline) -> Vec<EventRecord> {
    timeline
        .iter()
        .map(|e| EventRecord {
            sequence: e.sequence,
            timestamp: e.timestamp,
            sector: e.sector,
            pid: e.pid,
            byte_count: e.byte_count,
            action: e.action_char(),
        })
        .collect()
}

/// Every bucketed nugget, in sector order
pub fn nugget_listing(index: &SectorIndex) -> Vec<NuggetRecord> {
    index
        .nuggets_in_order()
        .map(|n| NuggetRecord {
            sector: n.sector,
            timestamp: n.first_timestamp().unwrap_or_default(),
            pid: n.pid,
            size: n.size,
            path: n.path_string(),
            status: n.status,
            merged_into: n
                .merged_into
                .and_then(|id| index.nugget(id))
                .map(|target| target.sector),
        })
        .collect()
}
