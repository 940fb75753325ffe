//! Aggregation of reconstructed trace data into statistics.
//!
//! This module turns the timeline and sector index into:
//! - Event counts by direction (type)
//! - Per-CPU event counters
//! - Latency statistics per request path and per process

pub mod cpu_stats;
pub mod metrics;
pub mod path_stats;
pub mod pid_stats;
pub mod registry;
pub mod type_stats;

// Re-export main types and functions
pub use cpu_stats::{CpuStat, CpuStatistic};
pub use metrics::{percentage, LatencyStat, ReadWriteLatency};
pub use path_stats::{is_excluded_path, PathStat, PathStatistic};
pub use pid_stats::{PidStat, PidStatistic};
pub use registry::{build_statistics, Statistic, StatisticReport, StatisticsRun, StatsSelection};
pub use type_stats::{TypeStatistic, TypeSummary};
