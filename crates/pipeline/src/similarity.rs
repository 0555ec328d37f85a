//! Cosine similarity between users and top-K neighbor selection.

use crate::matrix::RatingMatrix;
use rayon::prelude::*;
use serde::Serialize;
use sprs::CsVecView;
use std::cmp::Ordering;
use tracing::debug;

/// Default neighborhood size
pub const DEFAULT_NEIGHBORS: usize = 10;

/// `(u . v) / (|u| * |v|)` over two sparse rating rows.
///
/// Returns 0.0 when either vector has zero norm. Both views must come from the
/// same matrix (equal dimension).
pub fn cosine_similarity(u: &CsVecView<'_, f64>, v: &CsVecView<'_, f64>) -> f64 {
    let norm_u = u.dot(u).sqrt();
    let norm_v = v.dot(v).sqrt();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    u.dot(v) / (norm_u * norm_v)
}

/// A user row paired with its similarity to the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredUser {
    pub row: usize,
    pub similarity: f64,
}

/// Highest similarity first, lower row on ties
fn by_similarity(a: &ScoredUser, b: &ScoredUser) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.row.cmp(&b.row))
}

/// Scores eligible users against the target and keeps the closest K.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    neighbors: usize,
}

impl SimilarityEngine {
    pub fn new(neighbors: usize) -> Self {
        Self { neighbors }
    }

    /// Similarity of every row in `rows` to `target_row`, in input order.
    ///
    /// The target itself is scored like any other row when present. Rows that
    /// are out of bounds are skipped.
    pub fn similarity_vector(
        &self,
        matrix: &RatingMatrix,
        target_row: usize,
        rows: &[usize],
    ) -> Vec<ScoredUser> {
        let Some(target) = matrix.row_view(target_row) else {
            return Vec::new();
        };

        rows.par_iter()
            .filter_map(|&row| {
                matrix.row_view(row).map(|other| ScoredUser {
                    row,
                    similarity: cosine_similarity(&target, &other),
                })
            })
            .collect()
    }

    /// The K most similar rows among `eligible`, target excluded.
    ///
    /// Ordered by similarity descending; equal similarities go to the lower
    /// row index first.
    pub fn top_neighbors(
        &self,
        matrix: &RatingMatrix,
        target_row: usize,
        eligible: &[usize],
    ) -> Vec<ScoredUser> {
        let mut scored = self.similarity_vector(matrix, target_row, eligible);
        scored.retain(|s| s.row != target_row);
        scored.sort_by(by_similarity);
        scored.truncate(self.neighbors);

        debug!(
            "Selected {} of {} eligible users as neighbors",
            scored.len(),
            eligible.iter().filter(|&&row| row != target_row).count()
        );

        scored
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityIndex;
    use data_loader::{RatingLog, RatingRecord};

    fn matrix(community: Vec<RatingRecord>, target: Vec<RatingRecord>) -> (IdentityIndex, RatingMatrix) {
        let log = RatingLog::new("me", community, target);
        let index = IdentityIndex::build(&log);
        let matrix = RatingMatrix::build(&log, &index);
        (index, matrix)
    }

    #[test]
    fn test_cosine_known_value() {
        // me = (1, 1, 0), alice = (1, 0, 1) -> 1 / 2
        let (index, m) = matrix(
            vec![RatingRecord::new("alice", 1, 1.0), RatingRecord::new("alice", 3, 1.0)],
            vec![RatingRecord::new("me", 1, 1.0), RatingRecord::new("me", 2, 1.0)],
        );
        let me = m.row_view(0).unwrap();
        let alice = m.row_view(index.row("alice").unwrap()).unwrap();

        assert!((cosine_similarity(&me, &alice) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_symmetric_and_self() {
        let (index, m) = matrix(
            vec![
                RatingRecord::new("alice", 1, 4.0),
                RatingRecord::new("alice", 2, 2.5),
                RatingRecord::new("alice", 4, 1.0),
            ],
            vec![RatingRecord::new("me", 1, 3.0), RatingRecord::new("me", 2, 5.0)],
        );
        let me = m.row_view(0).unwrap();
        let alice = m.row_view(index.row("alice").unwrap()).unwrap();

        let ab = cosine_similarity(&me, &alice);
        let ba = cosine_similarity(&alice, &me);
        assert!((ab - ba).abs() < 1e-12);
        assert!((cosine_similarity(&me, &me) - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(&alice, &alice) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_vector() {
        // The target row exists but holds no ratings
        let (index, m) = matrix(vec![RatingRecord::new("alice", 1, 4.0)], Vec::new());
        let me = m.row_view(0).unwrap();
        let alice = m.row_view(index.row("alice").unwrap()).unwrap();

        assert_eq!(cosine_similarity(&me, &alice), 0.0);
        assert_eq!(cosine_similarity(&me, &me), 0.0);
    }

    #[test]
    fn test_similarity_vector_includes_self() {
        let (_, m) = matrix(
            vec![RatingRecord::new("alice", 1, 4.0)],
            vec![RatingRecord::new("me", 1, 2.0)],
        );
        let scores = SimilarityEngine::default().similarity_vector(&m, 0, &[0, 1]);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].row, 0);
        assert!((scores[0].similarity - 1.0).abs() < 1e-12);
        assert_eq!(scores[1].row, 1);
    }

    #[test]
    fn test_top_neighbors_order_and_ties() {
        // me = (1, 1); u1 = (1, 0); u2 = (1, 1); u3 = (0, 1); u4 = (2, 2)
        let (index, m) = matrix(
            vec![
                RatingRecord::new("u1", 1, 1.0),
                RatingRecord::new("u2", 1, 1.0),
                RatingRecord::new("u2", 2, 1.0),
                RatingRecord::new("u3", 2, 1.0),
                RatingRecord::new("u4", 1, 2.0),
                RatingRecord::new("u4", 2, 2.0),
            ],
            vec![RatingRecord::new("me", 1, 1.0), RatingRecord::new("me", 2, 1.0)],
        );
        let eligible: Vec<usize> = (0..index.num_users()).collect();
        let top = SimilarityEngine::new(10).top_neighbors(&m, 0, &eligible);
        let rows: Vec<usize> = top.iter().map(|s| s.row).collect();

        let row = |u: &str| index.row(u).unwrap();
        assert_eq!(rows, vec![row("u2"), row("u4"), row("u1"), row("u3")]);
        assert!(!rows.contains(&0));
    }

    #[test]
    fn test_top_neighbors_truncates() {
        let community: Vec<RatingRecord> = (0..25)
            .map(|i| RatingRecord::new(format!("user{}", i), 1, 1.0 + i as f64))
            .collect();
        let (_, m) = matrix(community, vec![RatingRecord::new("me", 1, 3.0)]);
        let eligible: Vec<usize> = (0..26).collect();

        let top = SimilarityEngine::default().top_neighbors(&m, 0, &eligible);
        assert_eq!(top.len(), DEFAULT_NEIGHBORS);
        // All similarities are 1.0 so ties fall back to row order
        let rows: Vec<usize> = top.iter().map(|s| s.row).collect();
        assert_eq!(rows, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_only_target_eligible() {
        let (_, m) = matrix(
            vec![RatingRecord::new("alice", 1, 4.0)],
            vec![RatingRecord::new("me", 1, 2.0)],
        );
        assert!(SimilarityEngine::default().top_neighbors(&m, 0, &[0]).is_empty());
    }
}
