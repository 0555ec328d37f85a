//! What the pipeline knows about the user it is recommending for.

use crate::identity::{IdentityIndex, TARGET_ROW};
use crate::matrix::RatingMatrix;
use data_loader::{ItemId, UserId};
use std::collections::HashSet;

/// The target user's side of a run, captured once from the matrix.
#[derive(Debug, Clone)]
pub struct TargetContext {
    pub row: usize,
    pub user_id: UserId,
    /// Columns the target has rated
    pub rated_columns: HashSet<usize>,
    /// Item ids the target has rated
    pub rated_items: HashSet<ItemId>,
}

impl TargetContext {
    pub fn new(matrix: &RatingMatrix, index: &IdentityIndex) -> Self {
        let rated_columns: HashSet<usize> =
            matrix.rated_columns(TARGET_ROW).iter().copied().collect();
        let rated_items = rated_columns
            .iter()
            .filter_map(|&col| index.item_id(col))
            .collect();

        Self {
            row: TARGET_ROW,
            user_id: index.user_id(TARGET_ROW).unwrap_or_default().to_string(),
            rated_columns,
            rated_items,
        }
    }

    /// Number of columns both the target and `row` have rated
    pub fn overlap_with(&self, matrix: &RatingMatrix, row: usize) -> usize {
        matrix
            .rated_columns(row)
            .iter()
            .filter(|&col| self.rated_columns.contains(col))
            .count()
    }

    pub fn has_ratings(&self) -> bool {
        !self.rated_columns.is_empty()
    }

    pub fn has_rated(&self, item_id: ItemId) -> bool {
        self.rated_items.contains(&item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{RatingLog, RatingRecord};

    #[test]
    fn test_context_from_matrix() {
        let log = RatingLog::new(
            "me",
            vec![
                RatingRecord::new("alice", 1, 3.0),
                RatingRecord::new("alice", 2, 4.0),
                RatingRecord::new("alice", 3, 4.0),
                RatingRecord::new("bob", 9, 2.0),
            ],
            vec![RatingRecord::new("me", 1, 5.0), RatingRecord::new("me", 3, 1.0)],
        );
        let index = IdentityIndex::build(&log);
        let matrix = RatingMatrix::build(&log, &index);
        let context = TargetContext::new(&matrix, &index);

        assert_eq!(context.row, 0);
        assert_eq!(context.user_id, "me");
        assert!(context.has_ratings());
        assert!(context.has_rated(1));
        assert!(context.has_rated(3));
        assert!(!context.has_rated(2));

        assert_eq!(context.overlap_with(&matrix, index.row("alice").unwrap()), 2);
        assert_eq!(context.overlap_with(&matrix, index.row("bob").unwrap()), 0);
        assert_eq!(context.overlap_with(&matrix, 0), 2);
    }

    #[test]
    fn test_context_without_target_ratings() {
        let log = RatingLog::new("me", vec![RatingRecord::new("alice", 1, 3.0)], Vec::new());
        let index = IdentityIndex::build(&log);
        let matrix = RatingMatrix::build(&log, &index);
        let context = TargetContext::new(&matrix, &index);

        assert!(!context.has_ratings());
        assert_eq!(context.overlap_with(&matrix, 1), 0);
    }
}
