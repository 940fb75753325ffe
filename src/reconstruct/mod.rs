//! Request lifecycle reconstruction.
//!
//! This module transforms decoded trace events into:
//! - A time-ordered timeline (filtered on ingestion)
//! - A sector-indexed set of nuggets, one per logical request
//! - Merge links between requests that were combined by the block layer

pub mod nugget;
pub mod sector_index;
pub mod timeline;

// Re-export main types
pub use nugget::{Nugget, NuggetId, NuggetStatus, PathStep};
pub use sector_index::{ReconstructionSummary, SectorIndex};
pub use timeline::{Timeline, TraceFilter};
