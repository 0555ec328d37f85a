//! # Recommender
//!
//! Runs one user-based collaborative filtering pass:
//! 1. Index users and items (target at row 0)
//! 2. Build the sparse rating matrix
//! 3. Keep users with enough co-rated items (plus any extra filters)
//! 4. Score them by cosine similarity and keep the top K
//! 5. Aggregate and rank the neighbors' unseen items
//! 6. Attach titles, skipping items without metadata
//!
//! Degenerate inputs (empty log, target without ratings, nobody eligible) give
//! an empty run rather than an error.

use crate::aggregate::{CandidateAggregator, DEFAULT_MAX_RECOMMENDATIONS, RankedCandidate};
use crate::context::TargetContext;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{DEFAULT_MIN_OVERLAP, MinimumOverlapFilter};
use crate::identity::IdentityIndex;
use crate::matrix::RatingMatrix;
use crate::similarity::{DEFAULT_NEIGHBORS, ScoredUser, SimilarityEngine};
use crate::traits::{ItemMetadata, NeighborFilter};
use anyhow::{Context, Result};
use data_loader::{ItemId, RatingLog, UserId};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Algorithm knobs of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Co-rated items a user needs before it can be a neighbor
    pub min_overlap: usize,
    /// Neighborhood size (K)
    pub neighbors: usize,
    /// Length of the ranked list (N)
    pub max_recommendations: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_overlap: DEFAULT_MIN_OVERLAP,
            neighbors: DEFAULT_NEIGHBORS,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
        }
    }
}

/// A ranked item ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub average_rating: f64,
    pub supporting_neighbor_count: usize,
    /// Neighbors that rated the item, in neighbor order
    #[serde(skip)]
    pub supporters: Vec<UserId>,
}

/// A selected neighbor of the target user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub row: usize,
    pub similarity: f64,
    /// Items co-rated with the target
    pub overlap: usize,
}

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub users: usize,
    pub items: usize,
    pub ratings: usize,
    pub target_ratings: usize,
    /// Users passing the neighbor filters, target excluded
    pub eligible_users: usize,
    pub candidates: usize,
    /// Ranked items dropped for lack of metadata
    pub skipped_items: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationRun {
    pub neighbors: Vec<Neighbor>,
    pub recommendations: Vec<Recommendation>,
    pub stats: RunStats,
}

impl RecommendationRun {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// The intermediate state after neighbor selection.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub index: IdentityIndex,
    pub matrix: RatingMatrix,
    pub target: TargetContext,
    /// Eligible rows, ascending, target included
    pub eligible: Vec<usize>,
    /// Top K, most similar first
    pub neighbors: Vec<ScoredUser>,
}

impl Neighborhood {
    fn empty(log: &RatingLog) -> Self {
        let index = IdentityIndex::build(log);
        let matrix = RatingMatrix::build(log, &index);
        let target = TargetContext::new(&matrix, &index);
        Self {
            index,
            matrix,
            target,
            eligible: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    /// Neighbors with their user ids and overlap counts
    pub fn describe(&self) -> Vec<Neighbor> {
        self.neighbors
            .iter()
            .filter_map(|scored| {
                self.index.user_id(scored.row).map(|user_id| Neighbor {
                    user_id: user_id.to_string(),
                    row: scored.row,
                    similarity: scored.similarity,
                    overlap: self.target.overlap_with(&self.matrix, scored.row),
                })
            })
            .collect()
    }

    fn stats(&self) -> RunStats {
        RunStats {
            users: self.index.num_users(),
            items: self.index.num_items(),
            ratings: self.matrix.nnz(),
            target_ratings: self.target.rated_columns.len(),
            eligible_users: self.eligible.iter().filter(|&&row| row != self.target.row).count(),
            ..RunStats::default()
        }
    }
}

/// Map ranked candidates to recommendations.
///
/// Items the lookup has no title for are skipped with a warning; the rest keep
/// their order and nothing is back-filled. Returns the recommendations and the
/// number of skipped items.
pub fn enrich(
    ranked: Vec<RankedCandidate>,
    index: &IdentityIndex,
    metadata: &impl ItemMetadata,
) -> (Vec<Recommendation>, usize) {
    let mut skipped = 0;
    let mut recommendations = Vec::with_capacity(ranked.len());

    for candidate in ranked {
        let Some(title) = metadata.title(candidate.item_id) else {
            warn!(
                "No metadata for item {}, skipping (supported by {} neighbors)",
                candidate.item_id,
                candidate.support()
            );
            skipped += 1;
            continue;
        };

        recommendations.push(Recommendation {
            item_id: candidate.item_id,
            title: title.to_string(),
            average_rating: candidate.average_rating(),
            supporting_neighbor_count: candidate.support(),
            supporters: candidate
                .supporters
                .iter()
                .filter_map(|&row| index.user_id(row).map(str::to_string))
                .collect(),
        });
    }

    (recommendations, skipped)
}

/// User-based collaborative filtering recommender.
///
/// ## Usage
/// ```ignore
/// let recommender = Recommender::new()
///     .with_min_overlap(20)
///     .with_neighbors(10)
///     .with_max_recommendations(100);
///
/// let run = recommender.recommend(&dataset.log, &dataset.catalog)?;
/// ```
pub struct Recommender {
    config: RecommenderConfig,
    /// Applied after the overlap filter
    filters: FilterPipeline,
}

impl Recommender {
    pub fn new() -> Self {
        Self::with_config(RecommenderConfig::default())
    }

    pub fn with_config(config: RecommenderConfig) -> Self {
        Self {
            config,
            filters: FilterPipeline::new(),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn with_min_overlap(mut self, min_overlap: usize) -> Self {
        self.config.min_overlap = min_overlap;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.config.neighbors = neighbors;
        self
    }

    pub fn with_max_recommendations(mut self, max_recommendations: usize) -> Self {
        self.config.max_recommendations = max_recommendations;
        self
    }

    /// Add a neighbor filter that runs after the overlap filter
    pub fn add_filter(mut self, filter: impl NeighborFilter + 'static) -> Self {
        self.filters = self.filters.add_filter(filter);
        self
    }

    /// Stages 1 to 4: index, matrix, eligibility and top-K neighbors.
    #[instrument(skip_all, fields(target_user = %log.target_user()))]
    pub fn build_neighborhood(&self, log: &RatingLog) -> Result<Neighborhood> {
        if log.is_empty() {
            info!("Rating log is empty, nothing to compare against");
            return Ok(Neighborhood::empty(log));
        }

        let index = IdentityIndex::build(log);
        let matrix = RatingMatrix::build(log, &index);
        let target = TargetContext::new(&matrix, &index);
        info!(
            "Indexed {} users and {} items ({} ratings)",
            index.num_users(),
            index.num_items(),
            matrix.nnz()
        );

        if !target.has_ratings() {
            info!("Target user {} has no ratings", target.user_id);
            return Ok(Neighborhood {
                index,
                matrix,
                target,
                eligible: Vec::new(),
                neighbors: Vec::new(),
            });
        }

        let rows: Vec<usize> = (0..index.num_users()).collect();
        let eligible = MinimumOverlapFilter::new(self.config.min_overlap)
            .apply(rows, &matrix, &target)
            .context("Failed to apply overlap filter")?;
        let eligible = self
            .filters
            .apply(eligible, &matrix, &target)
            .context("Failed to apply neighbor filters")?;
        info!(
            "{} users share at least {} rated items with the target",
            eligible.len().saturating_sub(1),
            self.config.min_overlap
        );

        let neighbors =
            SimilarityEngine::new(self.config.neighbors).top_neighbors(&matrix, target.row, &eligible);
        if let Some(closest) = neighbors.first() {
            debug!(
                "Closest neighbor row {} with similarity {:.4}",
                closest.row, closest.similarity
            );
        }
        info!("Selected {} neighbors", neighbors.len());

        Ok(Neighborhood {
            index,
            matrix,
            target,
            eligible,
            neighbors,
        })
    }

    /// The target's neighbors, most similar first.
    pub fn find_neighbors(&self, log: &RatingLog) -> Result<Vec<Neighbor>> {
        Ok(self.build_neighborhood(log)?.describe())
    }

    /// Run the whole pipeline.
    ///
    /// Errors only come from neighbor filters added with
    /// [`add_filter`](Self::add_filter); the built-in stages cannot fail.
    #[instrument(skip_all, fields(target_user = %log.target_user()))]
    pub fn recommend(
        &self,
        log: &RatingLog,
        metadata: &impl ItemMetadata,
    ) -> Result<RecommendationRun> {
        let start = Instant::now();

        let neighborhood = self.build_neighborhood(log)?;
        let mut stats = neighborhood.stats();

        if neighborhood.neighbors.is_empty() {
            info!("No eligible neighbors, returning an empty run");
            return Ok(RecommendationRun {
                neighbors: Vec::new(),
                recommendations: Vec::new(),
                stats,
            });
        }

        let ranked = CandidateAggregator::new(self.config.max_recommendations).aggregate(
            &neighborhood.matrix,
            &neighborhood.index,
            &neighborhood.neighbors,
            &neighborhood.target,
        );
        stats.candidates = ranked.len();
        info!("Ranked {} candidate items", ranked.len());

        let (recommendations, skipped) = enrich(ranked, &neighborhood.index, metadata);
        stats.skipped_items = skipped;
        if skipped > 0 {
            warn!("Skipped {} items without metadata", skipped);
        }

        info!(
            "Produced {} recommendations in {:?}",
            recommendations.len(),
            start.elapsed()
        );

        Ok(RecommendationRun {
            neighbors: neighborhood.describe(),
            recommendations,
            stats,
        })
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}
