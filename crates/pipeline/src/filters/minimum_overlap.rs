//! Filter on the number of items a user has co-rated with the target.
//!
//! Cosine similarity over a handful of shared items is noise, so users who
//! overlap the target on fewer than `min_overlap` items never become
//! neighbors.

use crate::context::TargetContext;
use crate::matrix::RatingMatrix;
use crate::traits::NeighborFilter;
use anyhow::Result;
use rayon::prelude::*;

/// Default number of co-rated items a neighbor needs
pub const DEFAULT_MIN_OVERLAP: usize = 20;

/// Keeps users whose co-rated overlap with the target is at least the
/// threshold.
///
/// ## Algorithm
/// For each row other than the target:
/// 1. Walk the user's rated columns
/// 2. Count those the target also rated
/// 3. Keep the row if count >= min_overlap
///
/// The target row is always kept.
pub struct MinimumOverlapFilter {
    min_overlap: usize,
}

impl MinimumOverlapFilter {
    pub fn new(min_overlap: usize) -> Self {
        Self { min_overlap }
    }
}

impl Default for MinimumOverlapFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OVERLAP)
    }
}

impl NeighborFilter for MinimumOverlapFilter {
    fn name(&self) -> &str {
        "MinimumOverlapFilter"
    }

    fn apply(
        &self,
        rows: Vec<usize>,
        matrix: &RatingMatrix,
        target: &TargetContext,
    ) -> Result<Vec<usize>> {
        // Indexed parallel filter keeps the input order
        let filtered: Vec<usize> = rows
            .into_par_iter()
            .filter(|&row| row == target.row || target.overlap_with(matrix, row) >= self.min_overlap)
            .collect();

        Ok(filtered)
    }
}
