//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Reads the trace file into memory
//! 2. Decodes the records
//! 3. Ingests them into the timeline
//! 4. Replays the timeline into the sector index
//! 5. Runs the selected statistics
//! 6. Writes output files

use super::models::{AnalyzeArgs, PrintMode};
use crate::aggregator::build_statistics;
use crate::output::{event_listing, nugget_listing, render_text_report, write_report, AnalysisReport};
use crate::parser::RecordReader;
use crate::reconstruct::{SectorIndex, Timeline};
use crate::utils::config::MAX_PATH_LEN_LIMIT;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Analyze command arguments
///
/// # Returns
/// The finished report, after any requested output was written
///
/// # Errors
/// * Trace file read failures
/// * Record decoding errors (truncation, bad magic)
/// * Allocation failure during reconstruction
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<AnalysisReport> {
    let start_time = Instant::now();

    info!("Starting analysis of: {}", args.input.display());

    // Step 1: Read trace
    info!("Step 1/6: Reading trace file...");
    let buf = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read trace file {}", args.input.display()))?;

    debug!("Read {} bytes", buf.len());

    // Step 2: Decode records
    info!("Step 2/6: Decoding records...");
    let events = RecordReader::new(&buf)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to decode trace records")?;
    let events_read = events.len();

    // Step 3: Ingest into timeline
    info!("Step 3/6: Building timeline...");
    let mut timeline = Timeline::new(args.filter);
    let ingested = timeline.ingest_all(events);

    debug!("Ingested {} of {} events", ingested, events_read);

    // Step 4: Replay into sector index
    info!("Step 4/6: Reconstructing requests...");
    let mut index = SectorIndex::new(args.max_path_len);
    let summary = index
        .replay(&timeline)
        .context("Failed to reconstruct requests")?;

    debug!(
        "{} buckets, {} nuggets",
        index.bucket_count(),
        index.nugget_count()
    );

    // Step 5: Statistics
    info!("Step 5/6: Computing statistics...");
    let reports = build_statistics(&args.stats).run(&index, &timeline);

    let mut report = AnalysisReport::new(args.input.display().to_string(), args.filter);
    report.events_read = events_read as u64;
    report.events_ingested = timeline.len() as u64;
    report.events_filtered = timeline.dropped() as u64;
    report.first_timestamp = timeline.first_timestamp();
    report.reconstruction = summary;
    report.absorb_statistics(reports);

    match args.print_mode {
        Some(PrintMode::Events) => report.events = Some(event_listing(&timeline)),
        Some(PrintMode::Nuggets) => report.nuggets = Some(nugget_listing(&index)),
        None => {}
    }

    // Step 6: Write outputs
    if let Some(output) = &args.output_json {
        info!("Step 6/6: Writing output files...");
        write_report(&report, output).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", output.display());
    } else {
        info!("Step 6/6: Skipping report file (not requested)");
    }

    if args.print_summary || args.print_mode.is_some() {
        println!("\n{}", "=".repeat(80));
        println!("TRACE ANALYSIS");
        println!("{}", "=".repeat(80));
        println!("{}", render_text_report(&report));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input trace path cannot be empty");
    }

    let filter = &args.filter;
    if filter.time_start > filter.time_end {
        anyhow::bail!("Time window start must not be after its end");
    }

    if filter.sector_start > filter.sector_end {
        anyhow::bail!("Sector window start must not be after its end");
    }

    if args.max_path_len == 0 {
        anyhow::bail!("max_path_len must be greater than 0");
    }

    if args.max_path_len > MAX_PATH_LEN_LIMIT {
        anyhow::bail!("max_path_len is too large (max {})", MAX_PATH_LEN_LIMIT);
    }

    Ok(())
}
