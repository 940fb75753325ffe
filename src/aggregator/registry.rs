//! Statistics registry and single-pass dispatch.
//!
//! Two independent families of statistics are supported: tree-bound ones
//! see every nugget of the sector index, list-bound ones see every event of
//! the timeline. Each family gets exactly one traversal per run:
//! all `init` hooks, then every element visited by each statistic in
//! registration order, then all `finalize` hooks with the element count.

use super::cpu_stats::{CpuStat, CpuStatistic};
use super::path_stats::{PathStat, PathStatistic};
use super::pid_stats::{PidStat, PidStatistic};
use super::type_stats::{TypeStatistic, TypeSummary};
use crate::parser::BlockIoEvent;
use crate::reconstruct::{Nugget, SectorIndex, Timeline};
use crate::utils::config::REGISTRY_CAPACITY;
use log::{debug, info};

/// A pluggable aggregator over elements of type `E`
pub trait Statistic<E> {
    fn name(&self) -> &'static str;

    fn init(&mut self) {}

    fn visit(&mut self, element: &E);

    /// Called once after the pass with the number of elements visited
    fn finalize(&mut self, _total: usize) {}

    fn into_report(self: Box<Self>) -> StatisticReport;
}

/// Finalized output of one statistic
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticReport {
    Type(TypeSummary),
    Path(Vec<PathStat>),
    Pid(Vec<PidStat>),
    Cpu(Vec<CpuStat>),
}

/// Which optional statistics to run; the type statistic always runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSelection {
    pub path: bool,
    pub pid: bool,
    pub cpu: bool,
}

impl StatsSelection {
    pub fn all() -> Self {
        Self {
            path: true,
            pid: true,
            cpu: true,
        }
    }
}

/// Per-invocation statistics context. Owns every registered aggregator
/// and its accumulated state; nothing is shared between runs.
pub struct StatisticsRun {
    tree: Vec<Box<dyn Statistic<Nugget>>>,
    list: Vec<Box<dyn Statistic<BlockIoEvent>>>,
    capacity: usize,
}

impl Default for StatisticsRun {
    fn default() -> Self {
        Self::with_capacity(REGISTRY_CAPACITY)
    }
}

impl StatisticsRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Vec::with_capacity(capacity),
            list: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register a statistic driven by the sector index.
    /// Returns `false` and ignores it when the family is full.
    pub fn register_tree(&mut self, statistic: Box<dyn Statistic<Nugget>>) -> bool {
        register(&mut self.tree, statistic, self.capacity, "tree")
    }

    /// Register a statistic driven by the timeline.
    /// Returns `false` and ignores it when the family is full.
    pub fn register_list(&mut self, statistic: Box<dyn Statistic<BlockIoEvent>>) -> bool {
        register(&mut self.list, statistic, self.capacity, "list")
    }

    pub fn tree_len(&self) -> usize {
        self.tree.len()
    }

    pub fn list_len(&self) -> usize {
        self.list.len()
    }

    /// Run both passes and collect every report, tree family first.
    ///
    /// **Public** - main entry point for statistics
    pub fn run(mut self, index: &SectorIndex, timeline: &Timeline) -> Vec<StatisticReport> {
        let nuggets = run_pass(&mut self.tree, index.nuggets_in_order());
        info!("Tree pass visited {} nuggets", nuggets);

        let events = run_pass(&mut self.list, timeline.iter());
        info!("List pass visited {} events", events);

        self.tree
            .into_iter()
            .map(|s| s.into_report())
            .chain(self.list.into_iter().map(|s| s.into_report()))
            .collect()
    }
}

fn register<E>(
    family: &mut Vec<Box<dyn Statistic<E>>>,
    statistic: Box<dyn Statistic<E>>,
    capacity: usize,
    label: &str,
) -> bool {
    if family.len() >= capacity {
        debug!(
            "Registry full ({} {} statistics), ignoring '{}'",
            capacity,
            label,
            statistic.name()
        );
        return false;
    }
    debug!("Registered {} statistic '{}'", label, statistic.name());
    family.push(statistic);
    true
}

fn run_pass<'a, E: 'a>(
    family: &mut [Box<dyn Statistic<E>>],
    elements: impl Iterator<Item = &'a E>,
) -> usize {
    if family.is_empty() {
        return 0;
    }

    for statistic in family.iter_mut() {
        statistic.init();
    }

    let mut total = 0;
    for element in elements {
        for statistic in family.iter_mut() {
            statistic.visit(element);
        }
        total += 1;
    }

    for statistic in family.iter_mut() {
        statistic.finalize(total);
    }
    total
}

/// Build a run holding the selected statistics.
///
/// **Public** - wires the CLI selection to concrete aggregators
pub fn build_statistics(selection: &StatsSelection) -> StatisticsRun {
    let mut run = StatisticsRun::new();

    run.register_list(Box::new(TypeStatistic::new()));
    if selection.cpu {
        run.register_list(Box::new(CpuStatistic::new()));
    }
    if selection.path {
        run.register_tree(Box::new(PathStatistic::new()));
    }
    if selection.pid {
        run.register_tree(Box::new(PidStatistic::new()));
    }

    run
}
