//! Filter implementations for the neighbor pipeline.
//!
//! This module contains the concrete filters that can be composed into a
//! FilterPipeline.

pub mod minimum_overlap;

// Re-export for convenience
pub use minimum_overlap::{DEFAULT_MIN_OVERLAP, MinimumOverlapFilter};
