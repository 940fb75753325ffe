//! dio-parse
//!
//! Offline analysis of block-device I/O traces. Raw trace records are
//! decoded, filtered into a time-ordered timeline, replayed into per-sector
//! request lifecycles (following back-merges, front-merges and completions),
//! and summarized by direction, request path, process and CPU.
//!
//! This crate provides the core implementation for the
//! `dio-parse` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! dio-parse analyze --input trace.bin --path-stats --summary
//! dio-parse --help
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod reconstruct;
pub mod utils;
