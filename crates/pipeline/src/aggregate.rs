//! Candidate aggregation and ranking.
//!
//! Every item a neighbor rated that the target has not becomes a candidate.
//! Candidates are ranked by how many neighbors support them and carry the mean
//! of those neighbors' ratings.

use crate::context::TargetContext;
use crate::identity::IdentityIndex;
use crate::matrix::RatingMatrix;
use crate::similarity::ScoredUser;
use data_loader::ItemId;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Default length of the ranked list
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 100;

/// An unrated item with the neighbor ratings that support it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub item_id: ItemId,
    /// One rating per supporting neighbor, in neighbor order
    pub ratings: Vec<f64>,
    /// Matrix rows of the supporting neighbors, parallel to `ratings`
    pub supporters: Vec<usize>,
}

impl RankedCandidate {
    /// Number of neighbors that rated the item
    pub fn support(&self) -> usize {
        self.ratings.len()
    }

    pub fn average_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        self.ratings.iter().sum::<f64>() / self.ratings.len() as f64
    }
}

/// Collects and ranks the neighbors' unseen items.
#[derive(Debug, Clone)]
pub struct CandidateAggregator {
    max_candidates: usize,
}

impl CandidateAggregator {
    pub fn new(max_candidates: usize) -> Self {
        Self { max_candidates }
    }

    /// Rank the neighbors' items the target has not rated.
    ///
    /// ## Algorithm
    /// 1. For each neighbor (in parallel), list its (column, rating) pairs
    ///    outside the target's rated set
    /// 2. Merge the lists in neighbor order into per-item accumulators
    /// 3. Sort by support descending, then item id ascending
    /// 4. Keep the first `max_candidates`
    pub fn aggregate(
        &self,
        matrix: &RatingMatrix,
        index: &IdentityIndex,
        neighbors: &[ScoredUser],
        target: &TargetContext,
    ) -> Vec<RankedCandidate> {
        let partials: Vec<(usize, Vec<(usize, f64)>)> = neighbors
            .par_iter()
            .map(|neighbor| {
                let unseen: Vec<(usize, f64)> = matrix
                    .row_entries(neighbor.row)
                    .filter(|(col, _)| !target.rated_columns.contains(col))
                    .collect();
                (neighbor.row, unseen)
            })
            .collect();

        // Sequential merge keeps each accumulator in neighbor order
        let mut accumulators: HashMap<usize, (Vec<f64>, Vec<usize>)> = HashMap::new();
        for (row, unseen) in partials {
            for (col, rating) in unseen {
                let (ratings, supporters) = accumulators.entry(col).or_default();
                ratings.push(rating);
                supporters.push(row);
            }
        }

        let total = accumulators.len();
        let mut ranked: Vec<RankedCandidate> = accumulators
            .into_iter()
            .filter_map(|(col, (ratings, supporters))| {
                index.item_id(col).map(|item_id| RankedCandidate {
                    item_id,
                    ratings,
                    supporters,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.support()
                .cmp(&a.support())
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        ranked.truncate(self.max_candidates);

        debug!(
            "Ranked {} candidate items, kept {}",
            total,
            ranked.len()
        );

        ranked
    }
}

impl Default for CandidateAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECOMMENDATIONS)
    }
}
