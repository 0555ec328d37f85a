//! The FilterPipeline orchestrates multiple neighbor filters.
//!
//! This module provides the FilterPipeline struct that chains filters
//! together using the builder pattern.

use crate::context::TargetContext;
use crate::matrix::RatingMatrix;
use crate::traits::NeighborFilter;
use anyhow::Result;
use tracing;

/// Chains multiple neighbor filters together.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(MinimumOverlapFilter::new(20));
///
/// let eligible = pipeline.apply(rows, &matrix, &target)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn NeighborFilter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl NeighborFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the filters, in application order
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the rows.
    ///
    /// ## Algorithm
    /// 1. Start with the input rows
    /// 2. For each filter in order:
    ///    a. Log filter name and input count
    ///    b. Apply the filter
    ///    c. Log output count
    /// 3. Put the target row back if a filter dropped it
    ///
    /// # Returns
    /// * `Ok(Vec<usize>)` - Ascending rows surviving every filter
    /// * `Err` - If any filter fails
    pub fn apply(
        &self,
        rows: Vec<usize>,
        matrix: &RatingMatrix,
        target: &TargetContext,
    ) -> Result<Vec<usize>> {
        let mut current = rows;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, matrix, target)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }

        if let Err(pos) = current.binary_search(&target.row) {
            current.insert(pos, target.row);
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::MinimumOverlapFilter;
    use crate::identity::IdentityIndex;
    use data_loader::{RatingLog, RatingRecord};

    /// Drops every row, target included
    struct DropAll;

    impl NeighborFilter for DropAll {
        fn name(&self) -> &str {
            "DropAll"
        }

        fn apply(&self, _rows: Vec<usize>, _matrix: &RatingMatrix, _target: &TargetContext) -> Result<Vec<usize>> {
            Ok(Vec::new())
        }
    }

    fn fixture() -> (RatingMatrix, TargetContext) {
        let log = RatingLog::new(
            "me",
            vec![
                RatingRecord::new("alice", 1, 3.0),
                RatingRecord::new("alice", 2, 3.0),
                RatingRecord::new("bob", 1, 2.0),
            ],
            vec![RatingRecord::new("me", 1, 5.0), RatingRecord::new("me", 2, 4.0)],
        );
        let index = IdentityIndex::build(&log);
        let matrix = RatingMatrix::build(&log, &index);
        let context = TargetContext::new(&matrix, &index);
        (matrix, context)
    }

    #[test]
    fn test_empty_pipeline() {
        let (matrix, context) = fixture();
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let filtered = pipeline.apply(vec![0, 1, 2], &matrix, &context).unwrap();
        assert_eq!(filtered, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_filter() {
        let (matrix, context) = fixture();
        let pipeline = FilterPipeline::new().add_filter(MinimumOverlapFilter::new(2));

        let filtered = pipeline.apply(vec![0, 1, 2], &matrix, &context).unwrap();
        assert_eq!(filtered, vec![0, 1]);
    }

    #[test]
    fn test_filters_run_in_order() {
        let (matrix, context) = fixture();
        let pipeline = FilterPipeline::new()
            .add_filter(MinimumOverlapFilter::new(1))
            .add_filter(MinimumOverlapFilter::new(2));

        assert_eq!(pipeline.names(), vec!["MinimumOverlapFilter", "MinimumOverlapFilter"]);
        let filtered = pipeline.apply(vec![0, 1, 2], &matrix, &context).unwrap();
        assert_eq!(filtered, vec![0, 1]);
    }

    #[test]
    fn test_target_restored() {
        let (matrix, context) = fixture();
        let pipeline = FilterPipeline::new().add_filter(DropAll);

        let filtered = pipeline.apply(vec![0, 1, 2], &matrix, &context).unwrap();
        assert_eq!(filtered, vec![0]);
    }
}
