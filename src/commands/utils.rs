use anyhow::{Context, Result};
use std::path::Path;
use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;

/// Validate a report JSON file
pub fn validate_report_file(file_path: impl AsRef<Path>) -> Result<()> {
    let file_path = file_path.as_ref();
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported report version {} (expected {})",
            report.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Trace: {}", report.trace_file);
    println!("  Events: {} read, {} ingested", report.events_read, report.events_ingested);
    println!("  Back-merges: {}", report.reconstruction.back_merges);
    println!("  Front-merges: {}", report.reconstruction.front_merges);
    println!("  Paths: {}", report.path_stats.len());
    println!("  Pids: {}", report.pid_stats.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("dio-parse Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string             - Schema version (e.g., '1.0.0')");
        println!("  trace_file: string          - Analyzed trace file");
        println!("  generated_at: string        - ISO 8601 timestamp");
        println!("  events_read: number         - Records decoded");
        println!("  events_ingested: number     - Records that passed the filter");
        println!("  events_filtered: number     - Records rejected by the filter");
        println!("  filter: object              - Time, sector and pid bounds");
        println!("  reconstruction: object      - Merge and completion counters");
        println!("  type_stats: object?         - Read/write/other counts and shares");
        println!("  path_stats: array?          - Latency per request path");
        println!("    path: string              - Action characters, e.g. 'QGIDC'");
        println!("    latency: object           - read/write count, min, avg, max (ns)");
        println!("    transitions: array        - Latency per adjacent action pair");
        println!("  pid_stats: array?           - Latency per process");
        println!("  cpu_stats: array?           - Read/write events per CPU");
        println!("  events: array?              - Raw event listing");
        println!("  nuggets: array?             - Raw request listing");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("dio-parse v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Offline analyzer for block-device I/O traces.");
}
