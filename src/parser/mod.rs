//! Binary trace decoding.
//!
//! This module handles:
//! - Reading fixed-layout trace records from a byte buffer
//! - Skipping the variable-length payload after each header
//! - Decoding action codes and category bits

pub mod action;
pub mod record;

// Re-export main types
pub use action::{action_char, category, IoKind};
pub use record::{decode_record, encode_record, read_trace_file, BlockIoEvent, RecordReader};
