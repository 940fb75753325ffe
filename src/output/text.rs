//! Terminal rendering of an analysis report.
//!
//! Every present section becomes a box-drawn table. Durations are printed as
//! `seconds.nanoseconds`; raw listings show time relative to the first event.

use super::schema::{AnalysisReport, EventRecord, NuggetRecord};
use crate::aggregator::{CpuStat, LatencyStat, PathStat, PidStat, TypeSummary};
use crate::reconstruct::NuggetStatus;
use crate::utils::config::DEFAULT_SUMMARY_ROWS;

const RESET: &str = "\x1b[0m";

/// Format nanoseconds as `s.nnnnnnnnn`
pub fn format_ns(ns: u64) -> String {
    format!("{}.{:09}", ns / 1_000_000_000, ns % 1_000_000_000)
}

/// Render every present report section as text
///
/// **Public** - used by the analyze command for `--summary` and `--print`
pub fn render_text_report(report: &AnalysisReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("  📄 TRACE {}", report.trace_file));
    lines.push(format!(
        "  events read {}, ingested {}, filtered {}",
        report.events_read, report.events_ingested, report.events_filtered
    ));
    let r = &report.reconstruction;
    lines.push(format!(
        "  applied {}, back-merges {}, front-merges {}, completions {}, inconsistencies {}, path overflows {}",
        r.events_applied, r.back_merges, r.front_merges, r.completions, r.inconsistencies, r.path_overflows
    ));

    if let Some(summary) = &report.type_stats {
        lines.push(String::new());
        render_type(summary, &mut lines);
    }
    if !report.cpu_stats.is_empty() {
        lines.push(String::new());
        render_cpu(&report.cpu_stats, &mut lines);
    }
    if !report.path_stats.is_empty() {
        lines.push(String::new());
        render_paths(&report.path_stats, &mut lines);
    }
    if !report.pid_stats.is_empty() {
        lines.push(String::new());
        render_pids(&report.pid_stats, &mut lines);
    }

    let base = report.first_timestamp.unwrap_or(0);
    if let Some(events) = &report.events {
        lines.push(String::new());
        render_events(events, base, &mut lines);
    }
    if let Some(nuggets) = &report.nuggets {
        lines.push(String::new());
        render_nuggets(nuggets, base, &mut lines);
    }

    lines.join("\n")
}

fn render_type(summary: &TypeSummary, lines: &mut Vec<String>) {
    lines.push("  📊 I/O TYPE".to_string());
    lines.push("  ┏━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━┓".to_string());
    lines.push(format!("  ┃ {:<7} ┃ {:^12} ┃ {:^8} ┃", "TYPE", "EVENTS", "%"));
    lines.push("  ┣━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━┫".to_string());
    for (name, count, pct, color) in [
        ("read", summary.read_count, summary.read_percentage, "\x1b[32m"),
        ("write", summary.write_count, summary.write_percentage, "\x1b[33m"),
        ("other", summary.other_count, summary.other_percentage, "\x1b[90m"),
    ] {
        lines.push(format!(
            "  ┃ {}{:<7}{} ┃ {:>12} ┃ {:>7.2}% ┃",
            color, name, RESET, count, pct
        ));
    }
    lines.push("  ┣━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━┫".to_string());
    lines.push(format!("  ┃ {:<7} ┃ {:>12} ┃ {:>8} ┃", "total", summary.total, ""));
    lines.push("  ┗━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━┛".to_string());
}

fn render_cpu(cpus: &[CpuStat], lines: &mut Vec<String>) {
    lines.push("  🧮 PER-CPU EVENTS".to_string());
    lines.push("  ┏━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┓".to_string());
    lines.push(format!("  ┃ {:<5} ┃ {:^12} ┃ {:^12} ┃", "CPU", "READ", "WRITE"));
    lines.push("  ┣━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━┫".to_string());
    for cpu in cpus {
        lines.push(format!(
            "  ┃ {:<5} ┃ {:>12} ┃ {:>12} ┃",
            cpu.cpu, cpu.read_count, cpu.write_count
        ));
    }
    lines.push("  ┗━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┛".to_string());
}

fn latency_header(label: &str, lines: &mut Vec<String>) {
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━┳━━━━━━━━┳━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<20} ┃ {:^5} ┃ {:^6} ┃ {:^13} ┃ {:^13} ┃ {:^13} ┃",
        label, "DIR", "COUNT", "MIN", "AVG", "MAX"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━╋━━━━━━━━╋━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━┫".to_string());
}

fn latency_footer(lines: &mut Vec<String>) {
    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━┻━━━━━━━━┻━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━┛".to_string());
}

fn latency_row(label: &str, dir: &str, stat: &LatencyStat, lines: &mut Vec<String>) {
    if stat.is_empty() {
        return;
    }
    let color = if dir == "R" { "\x1b[32m" } else { "\x1b[33m" };
    lines.push(format!(
        "  ┃ {:<20} ┃ {}{:^5}{} ┃ {:>6} ┃ {:>13} ┃ {:>13} ┃ {:>13} ┃",
        truncate(label, 20),
        color,
        dir,
        RESET,
        stat.count,
        format_ns(stat.min_time),
        format_ns(stat.average_time),
        format_ns(stat.max_time)
    ));
}

fn render_paths(paths: &[PathStat], lines: &mut Vec<String>) {
    lines.push("  🛤  LATENCY BY PATH".to_string());
    latency_header("PATH", lines);
    for path in paths.iter().take(DEFAULT_SUMMARY_ROWS) {
        latency_row(&path.path, "R", &path.latency.read, lines);
        latency_row(&path.path, "W", &path.latency.write, lines);
        for (i, transition) in path.transitions.iter().enumerate() {
            let label = match path.transition_label(i) {
                Some(l) => format!("  {}", l),
                None => continue,
            };
            latency_row(&label, "R", &transition.read, lines);
            latency_row(&label, "W", &transition.write, lines);
        }
    }
    latency_footer(lines);
    shown_note(DEFAULT_SUMMARY_ROWS, paths.len(), "paths", lines);
}

fn render_pids(pids: &[PidStat], lines: &mut Vec<String>) {
    lines.push("  👤 LATENCY BY PID".to_string());
    latency_header("PID", lines);
    for pid in pids.iter().take(DEFAULT_SUMMARY_ROWS) {
        let label = pid.pid.to_string();
        latency_row(&label, "R", &pid.latency.read, lines);
        latency_row(&label, "W", &pid.latency.write, lines);
    }
    latency_footer(lines);
    shown_note(DEFAULT_SUMMARY_ROWS, pids.len(), "pids", lines);
}

fn shown_note(limit: usize, total: usize, what: &str, lines: &mut Vec<String>) {
    if total > limit {
        lines.push(format!("   (Showing {} of {} {})", limit, total, what));
    }
}

fn render_events(events: &[EventRecord], base: u64, lines: &mut Vec<String>) {
    lines.push(format!("  📜 EVENTS ({})", events.len()));
    lines.push("  ┏━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━┳━━━━━━━━━━━━┳━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<16} ┃ {:^20} ┃ {:^9} ┃ {:^10} ┃ {:^6} ┃",
        "TIME", "SECTOR", "PID", "BYTES", "ACTION"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━╋━━━━━━━━━━━━╋━━━━━━━━┫".to_string());
    for e in events {
        lines.push(format!(
            "  ┃ {:>16} ┃ {:>20} ┃ {:>9} ┃ {:>10} ┃ {:^6} ┃",
            format_ns(e.timestamp.saturating_sub(base)),
            e.sector,
            e.pid,
            e.byte_count,
            e.action
        ));
    }
    lines.push("  ┗━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━┻━━━━━━━━━━━━┻━━━━━━━━┛".to_string());
}

fn status_label(status: NuggetStatus) -> &'static str {
    match status {
        NuggetStatus::Active => "active",
        NuggetStatus::BackMerged => "bmerged",
        NuggetStatus::FrontMerged => "fmerged",
        NuggetStatus::Complete => "done",
    }
}

fn render_nuggets(nuggets: &[NuggetRecord], base: u64, lines: &mut Vec<String>) {
    lines.push(format!("  🧱 NUGGETS ({})", nuggets.len()));
    lines.push("  ┏━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━┳━━━━━━━━━━━━┳━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<16} ┃ {:^20} ┃ {:^9} ┃ {:^10} ┃ {:^7} ┃ {:<20} ┃",
        "TIME", "SECTOR", "PID", "SIZE", "STATUS", "PATH"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━╋━━━━━━━━━━━━╋━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━━━━┫".to_string());
    for n in nuggets {
        lines.push(format!(
            "  ┃ {:>16} ┃ {:>20} ┃ {:>9} ┃ {:>10} ┃ {:^7} ┃ {:<20} ┃",
            format_ns(n.timestamp.saturating_sub(base)),
            n.sector,
            n.pid,
            n.size,
            status_label(n.status),
            truncate(&n.path, 20)
        ));
    }
    lines.push("  ┗━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━┻━━━━━━━━━━━━┻━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━┛".to_string());
}

/// Keep the tail of over-long labels
fn truncate(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len <= width {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - (width - 3)).collect();
        format!("...{}", tail)
    }
}
