//! dio-parse CLI
//!
//! Reconstructs request lifecycles from a binary block I/O trace and
//! reports latency and direction statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use dio_parse::aggregator::StatsSelection;
use dio_parse::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_report_file,
    AnalyzeArgs, PrintMode,
};
use dio_parse::reconstruct::TraceFilter;
use dio_parse::utils::config::DEFAULT_MAX_PATH_LEN;

/// dio-parse - Block I/O trace analyzer
#[derive(Parser, Debug)]
#[command(name = "dio-parse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a binary trace file
    Analyze {
        /// Binary trace file
        #[arg(short, long, env = "DIO_PARSE_INPUT")]
        input: PathBuf,

        /// Time window in seconds, e.g. 1.5,3
        #[arg(short, long, value_name = "START,END", value_parser = parse_time_window)]
        time: Option<(u64, u64)>,

        /// Sector window, e.g. 0,4096
        #[arg(short, long, value_name = "START,END", value_parser = parse_sector_window)]
        sector: Option<(u64, u64)>,

        /// Only ingest events from this process
        #[arg(short, long)]
        pid: Option<u32>,

        /// Latency statistics per request path
        #[arg(long)]
        path_stats: bool,

        /// Latency statistics per process
        #[arg(long)]
        pid_stats: bool,

        /// Read/write event counts per CPU
        #[arg(long)]
        cpu_stats: bool,

        /// Print a raw listing of events or nuggets
        #[arg(long, value_enum)]
        print: Option<PrintMode>,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of actions recorded per request
        #[arg(long, default_value_t = DEFAULT_MAX_PATH_LEN)]
        max_path_len: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            input,
            time,
            sector,
            pid,
            path_stats,
            pid_stats,
            cpu_stats,
            print,
            output,
            max_path_len,
            summary,
        } => {
            let mut filter = TraceFilter::default();
            if let Some((start, end)) = time {
                filter = filter.with_time(start, end);
            }
            if let Some((start, end)) = sector {
                filter = filter.with_sectors(start, end);
            }
            if let Some(pid) = pid {
                filter = filter.with_pid(pid);
            }

            let args = AnalyzeArgs {
                input,
                output_json: output,
                filter,
                stats: StatsSelection {
                    path: path_stats,
                    pid: pid_stats,
                    cpu: cpu_stats,
                },
                print_mode: print,
                max_path_len,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Split `START,END` into its two halves
fn split_window(s: &str) -> Result<(&str, &str), String> {
    s.split_once(',')
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| format!("expected START,END, got '{}'", s))
}

/// Parse a `START,END` window of fractional seconds into nanoseconds
fn parse_time_window(s: &str) -> Result<(u64, u64), String> {
    let (start, end) = split_window(s)?;
    Ok((seconds_to_ns(start)?, seconds_to_ns(end)?))
}

fn seconds_to_ns(s: &str) -> Result<u64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("invalid time '{}': {}", s, e))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid time '{}'", s));
    }
    Ok((secs * 1e9).round() as u64)
}

/// Parse a `START,END` sector window
fn parse_sector_window(s: &str) -> Result<(u64, u64), String> {
    let (start, end) = split_window(s)?;
    let parse = |v: &str| {
        v.parse::<u64>()
            .map_err(|e| format!("invalid sector '{}': {}", v, e))
    };
    Ok((parse(start)?, parse(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_window() {
        assert_eq!(parse_time_window("1.5,3"), Ok((1_500_000_000, 3_000_000_000)));
        assert_eq!(parse_time_window("0, 0.000000001"), Ok((0, 1)));
        assert!(parse_time_window("1.5").is_err());
        assert!(parse_time_window("-1,2").is_err());
        assert!(parse_time_window("a,b").is_err());
    }

    #[test]
    fn test_parse_sector_window() {
        assert_eq!(parse_sector_window("0,4096"), Ok((0, 4096)));
        assert!(parse_sector_window("10").is_err());
        assert!(parse_sector_window("x,10").is_err());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "dio-parse",
            "analyze",
            "--input",
            "trace.bin",
            "--time",
            "0,2",
            "--path-stats",
            "--print",
            "nuggets",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                time, path_stats, print, max_path_len, ..
            } => {
                assert_eq!(time, Some((0, 2_000_000_000)));
                assert!(path_stats);
                assert_eq!(print, Some(PrintMode::Nuggets));
                assert_eq!(max_path_len, DEFAULT_MAX_PATH_LEN);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
