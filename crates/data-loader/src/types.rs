//! Core domain types for the rating tables and the movie catalog.
//!
//! Three tables feed a run:
//! - the community rating log, keyed by user name and movie slug
//! - the movie catalog, mapping slugs to numeric item ids and titles
//! - the target user's own ratings, keyed by numeric item id
//!
//! After the catalog join everything speaks numeric item ids, and the two
//! rating tables are packed into a single [`RatingLog`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a user (a community username, or the reserved target name)
pub type UserId = String;

/// Numeric catalog identifier of a movie (TMDB id)
pub type ItemId = u64;

// =============================================================================
// Rating Types
// =============================================================================

/// One user's rating of one item.
///
/// A rating of exactly `0.0` means "watched but not rated" and never makes it
/// into a [`RatingLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
}

impl RatingRecord {
    pub fn new(user_id: impl Into<UserId>, item_id: ItemId, rating: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id,
            rating,
        }
    }

    /// True if this record carries an actual rating
    pub fn is_rated(&self) -> bool {
        self.rating != 0.0 && self.rating.is_finite()
    }
}

/// A row of the community log before the catalog join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRating {
    pub user_id: UserId,
    /// Catalog slug, e.g. "the-godfather"
    pub movie_slug: String,
    pub rating: f64,
}

/// A row of the target user's export before the catalog join
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRating {
    pub item_id: ItemId,
    pub rating: f64,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub item_id: ItemId,
    pub slug: String,
    pub title: String,
    pub year: Option<u16>,
}

/// Movie catalog with lookups by item id and by slug.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) movies: HashMap<ItemId, Movie>,
    pub(crate) slugs: HashMap<String, ItemId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a movie unless its id is already known.
    ///
    /// The first row for an id wins, and so does the first id for a slug.
    /// Returns `false` when the movie was ignored as a duplicate.
    pub fn insert_movie(&mut self, movie: Movie) -> bool {
        if self.movies.contains_key(&movie.item_id) {
            return false;
        }
        self.slugs
            .entry(movie.slug.clone())
            .or_insert(movie.item_id);
        self.movies.insert(movie.item_id, movie);
        true
    }

    pub fn get_movie(&self, item_id: ItemId) -> Option<&Movie> {
        self.movies.get(&item_id)
    }

    pub fn title(&self, item_id: ItemId) -> Option<&str> {
        self.movies.get(&item_id).map(|m| m.title.as_str())
    }

    /// Map a catalog slug to its numeric item id
    pub fn resolve_slug(&self, slug: &str) -> Option<ItemId> {
        self.slugs.get(slug).copied()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.movies.contains_key(&item_id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

// =============================================================================
// RatingLog - input of the recommendation pipeline
// =============================================================================

/// The combined rating log: community records followed by the target user's.
///
/// Built once per run and never modified afterwards. Unrated records
/// (rating `0.0` or non-finite) are removed on construction, and every target
/// record is tagged with the target user's id.
#[derive(Debug, Clone)]
pub struct RatingLog {
    target_user: UserId,
    community: Vec<RatingRecord>,
    target: Vec<RatingRecord>,
}

impl RatingLog {
    pub fn new(
        target_user: impl Into<UserId>,
        mut community: Vec<RatingRecord>,
        target: Vec<RatingRecord>,
    ) -> Self {
        let target_user = target_user.into();

        let before = community.len();
        community.retain(RatingRecord::is_rated);
        let dropped_community = before - community.len();

        let before = target.len();
        let target: Vec<RatingRecord> = target
            .into_iter()
            .filter(RatingRecord::is_rated)
            .map(|r| RatingRecord::new(target_user.clone(), r.item_id, r.rating))
            .collect();
        let dropped_target = before - target.len();

        if dropped_community + dropped_target > 0 {
            debug!(
                "Dropped {} community and {} target records without a rating",
                dropped_community, dropped_target
            );
        }

        Self {
            target_user,
            community,
            target,
        }
    }

    /// Id reserved for the user we are recommending for
    pub fn target_user(&self) -> &str {
        &self.target_user
    }

    /// Community portion of the log, in input order
    pub fn community(&self) -> &[RatingRecord] {
        &self.community
    }

    /// Target user's portion of the log, in input order
    pub fn target(&self) -> &[RatingRecord] {
        &self.target
    }

    /// Community records first, then the target's, in input order
    pub fn combined(&self) -> impl Iterator<Item = &RatingRecord> {
        self.community.iter().chain(self.target.iter())
    }

    pub fn len(&self) -> usize {
        self.community.len() + self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.community.is_empty() && self.target.is_empty()
    }
}
