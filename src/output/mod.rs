//! Output writers for analysis reports.
//!
//! This module handles writing data to disk and to the terminal:
//! - JSON reports (pretty)
//! - Text tables for the summary and raw listings

pub mod json;
pub mod schema;
pub mod text;

use crate::utils::error::OutputError;
use std::path::Path;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use schema::{event_listing, nugget_listing, AnalysisReport, EventRecord, NuggetRecord};
pub use text::{format_ns, render_text_report};

/// Validate that a path can be written as an output file
///
/// **Public** - shared by the writers
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty or points at a directory
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Output path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "{} is a directory",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path(Path::new("")).is_err());
        assert!(validate_path(&std::env::temp_dir()).is_err());
        assert!(validate_path(Path::new("out/report.json")).is_ok());
    }
}
