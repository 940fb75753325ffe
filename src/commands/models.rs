use crate::aggregator::StatsSelection;
use crate::reconstruct::TraceFilter;
use crate::utils::config::DEFAULT_MAX_PATH_LEN;
use clap::ValueEnum;
use std::path::PathBuf;

/// Raw listing printed alongside the statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintMode {
    /// Every ingested event, in time order
    Events,
    /// Every reconstructed request, in sector order
    Nuggets,
}

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Binary trace file to analyze
    pub input: PathBuf,

    /// Output path for the JSON report (optional)
    pub output_json: Option<PathBuf>,

    /// Time, sector and pid bounds applied at ingestion
    pub filter: TraceFilter,

    /// Optional statistics to run besides the type counts
    pub stats: StatsSelection,

    /// Raw listing to include (optional)
    pub print_mode: Option<PrintMode>,

    /// Maximum number of actions recorded per request
    pub max_path_len: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_json: None,
            filter: TraceFilter::default(),
            stats: StatsSelection::default(),
            print_mode: None,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            print_summary: false,
        }
    }
}
