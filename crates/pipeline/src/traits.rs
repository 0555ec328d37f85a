//! Seams of the recommendation pipeline.
//!
//! [`NeighborFilter`] narrows the set of users eligible to become neighbors,
//! and [`ItemMetadata`] resolves item ids into display titles once ranking is
//! done.

use crate::context::TargetContext;
use crate::matrix::RatingMatrix;
use anyhow::Result;
use data_loader::{Catalog, ItemId};
use std::collections::HashMap;

/// Core trait for narrowing the neighbor candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to run from rayon workers
/// - Filters take ownership of the row list and return the rows they keep
/// - Input rows are ascending and include the target row; implementations
///   keep both properties
pub trait NeighborFilter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of user rows.
    ///
    /// # Arguments
    /// * `rows` - Eligible user rows (takes ownership)
    /// * `matrix` - The rating matrix the rows index into
    /// * `target` - The target user's rated set
    ///
    /// # Returns
    /// * `Ok(Vec<usize>)` - The rows still eligible
    /// * `Err` - If filtering fails
    fn apply(
        &self,
        rows: Vec<usize>,
        matrix: &RatingMatrix,
        target: &TargetContext,
    ) -> Result<Vec<usize>>;
}

/// Item id -> display title lookup used after ranking.
pub trait ItemMetadata {
    fn title(&self, item_id: ItemId) -> Option<&str>;
}

impl ItemMetadata for Catalog {
    fn title(&self, item_id: ItemId) -> Option<&str> {
        Catalog::title(self, item_id)
    }
}

impl ItemMetadata for HashMap<ItemId, String> {
    fn title(&self, item_id: ItemId) -> Option<&str> {
        self.get(&item_id).map(String::as_str)
    }
}
