//! Loading the three input tables and joining them against the catalog.
//!
//! The community log references movies by slug while the target user's export
//! uses numeric ids. Both are resolved through the catalog (inner join), so
//! after loading every record in the [`RatingLog`] carries a catalog id.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file names inside a data directory
pub const RATINGS_FILE: &str = "ratings_export.csv";
pub const MOVIES_FILE: &str = "movie_data.csv";
pub const TARGET_FILE: &str = "ratings_tmdb_cleaned.csv";

/// Locations of the three input tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub ratings: PathBuf,
    pub movies: PathBuf,
    pub target: PathBuf,
}

impl DatasetPaths {
    /// Use the default file names inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            ratings: data_dir.join(RATINGS_FILE),
            movies: data_dir.join(MOVIES_FILE),
            target: data_dir.join(TARGET_FILE),
        }
    }
}

/// Everything a recommendation run needs: the catalog and the combined log
#[derive(Debug)]
pub struct Dataset {
    pub catalog: Catalog,
    pub log: RatingLog,
}

impl Dataset {
    /// Load and join all three tables.
    ///
    /// The files are parsed in parallel; the joins run once all three are in.
    pub fn load(paths: &DatasetPaths, target_user: &str) -> Result<Self> {
        info!("Loading rating tables (target user: {})", target_user);

        let ((community, movies), target) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_community_ratings(&paths.ratings),
                    || parser::parse_movies(&paths.movies),
                )
            },
            || parser::parse_target_ratings(&paths.target),
        );

        let community = community?;
        let movies = movies?;
        let target = target?;

        info!(
            "Parsed {} community ratings, {} movies, {} target ratings",
            community.len(),
            movies.len(),
            target.len()
        );

        let dataset = Self::from_parts(movies, community, target, target_user);
        let (movies, community, target) = dataset.counts();
        info!(
            "Dataset ready: {} movies, {} community ratings, {} target ratings",
            movies, community, target
        );
        Ok(dataset)
    }

    /// Build a dataset from already-parsed tables
    pub fn from_parts(
        movies: Vec<Movie>,
        community: Vec<CommunityRating>,
        target: Vec<TargetRating>,
        target_user: &str,
    ) -> Self {
        let catalog = build_catalog(movies);
        let community = join_community(&catalog, community);
        let target = join_target(&catalog, target, target_user);

        Self {
            log: RatingLog::new(target_user, community, target),
            catalog,
        }
    }

    /// (movies, community ratings, target ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.catalog.len(),
            self.log.community().len(),
            self.log.target().len(),
        )
    }
}

fn build_catalog(movies: Vec<Movie>) -> Catalog {
    let mut catalog = Catalog::new();
    let mut duplicates = 0usize;
    for movie in movies {
        if !catalog.insert_movie(movie) {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        debug!("Ignored {} duplicate catalog rows", duplicates);
    }
    catalog
}

/// Resolve slugs to item ids; ratings of movies missing from the catalog are dropped
fn join_community(catalog: &Catalog, rows: Vec<CommunityRating>) -> Vec<RatingRecord> {
    let total = rows.len();
    let records: Vec<RatingRecord> = rows
        .into_iter()
        .filter_map(|row| {
            catalog
                .resolve_slug(&row.movie_slug)
                .map(|item_id| RatingRecord::new(row.user_id, item_id, row.rating))
        })
        .collect();

    if records.len() < total {
        info!(
            "Dropped {} community ratings for movies missing from the catalog",
            total - records.len()
        );
    }
    records
}

/// Keep only target ratings whose item id exists in the catalog
fn join_target(catalog: &Catalog, rows: Vec<TargetRating>, target_user: &str) -> Vec<RatingRecord> {
    let total = rows.len();
    let records: Vec<RatingRecord> = rows
        .into_iter()
        .filter(|row| catalog.contains(row.item_id))
        .map(|row| RatingRecord::new(target_user, row.item_id, row.rating))
        .collect();

    if records.len() < total {
        info!(
            "Dropped {} target ratings for movies missing from the catalog",
            total - records.len()
        );
    }
    records
}
