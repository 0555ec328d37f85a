//! User-based collaborative filtering over a sparse rating matrix.
//!
//! This crate provides:
//! - IdentityIndex and RatingMatrix for the user x item ratings
//! - NeighborFilter trait and FilterPipeline for neighbor eligibility
//! - SimilarityEngine for cosine top-K neighbor selection
//! - CandidateAggregator for ranking the neighbors' unseen items
//! - Recommender tying the stages together
//!
//! ## Architecture
//! A run processes the rating log in stages:
//! 1. Users and items get dense indices, the target user at row 0
//! 2. Ratings land in a CSR matrix (last write wins)
//! 3. Filters keep users with enough items co-rated with the target
//! 4. The most similar eligible users become neighbors
//! 5. Their unseen items are ranked by neighbor support
//! 6. Titles are attached from an ItemMetadata lookup
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::Recommender;
//!
//! let run = Recommender::new()
//!     .with_min_overlap(20)
//!     .with_neighbors(10)
//!     .recommend(&dataset.log, &dataset.catalog)?;
//!
//! for rec in &run.recommendations {
//!     println!("{} ({:.2}, {} users)", rec.title, rec.average_rating, rec.supporting_neighbor_count);
//! }
//! ```

pub mod aggregate;
pub mod context;
pub mod filter_pipeline;
pub mod filters;
pub mod identity;
pub mod matrix;
pub mod recommender;
pub mod similarity;
pub mod traits;

// Re-export main types
pub use aggregate::{CandidateAggregator, RankedCandidate};
pub use context::TargetContext;
pub use filter_pipeline::FilterPipeline;
pub use identity::{IdentityIndex, TARGET_ROW};
pub use matrix::RatingMatrix;
pub use recommender::{
    Neighbor, Neighborhood, Recommendation, RecommendationRun, Recommender, RecommenderConfig,
    RunStats, enrich,
};
pub use similarity::{ScoredUser, SimilarityEngine, cosine_similarity};
pub use traits::{ItemMetadata, NeighborFilter};
