//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while decoding binary trace records
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("truncated record at offset {offset}: {available} bytes left, header needs {needed}")]
    TruncatedHeader {
        offset: usize,
        available: usize,
        needed: usize,
    },

    #[error("truncated payload at offset {offset}: declared {declared} bytes, {available} left")]
    TruncatedPayload {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("bad record magic {magic:#010x} at offset {offset}")]
    BadMagic { offset: usize, magic: u32 },

    #[error("failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while rebuilding request lifecycles
#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("{kind} at sector {sector}: no counterpart request found")]
    MergeTargetMissing { kind: MergeKind, sector: u64 },

    #[error("path of nugget at sector {sector} is full ({capacity} actions)")]
    PathOverflow { sector: u64, capacity: usize },

    #[error("out of memory while growing the sector index")]
    AllocationFailed(#[from] std::collections::TryReserveError),
}

impl ReconstructError {
    /// Recoverable errors skip a single transition; everything else aborts the run
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::AllocationFailed(_))
    }
}

/// Merge direction, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Back,
    Front,
}

impl std::fmt::Display for MergeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Back => f.write_str("back-merge"),
            Self::Front => f.write_str("front-merge"),
        }
    }
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
