//! # Data Loader Crate
//!
//! Loads the inputs of a recommendation run from CSV and joins them into the
//! shape the pipeline expects.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RatingRecord, RatingLog, Movie, Catalog)
//! - **parser**: Tolerant CSV readers for the three input tables
//! - **dataset**: Parallel loading and the catalog joins
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, DatasetPaths};
//! use std::path::Path;
//!
//! let dataset = Dataset::load(&DatasetPaths::in_dir(Path::new("data")), "me")?;
//!
//! println!(
//!     "{} community ratings, {} of mine",
//!     dataset.log.community().len(),
//!     dataset.log.target().len()
//! );
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod dataset;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use dataset::{Dataset, DatasetPaths};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    RatingRecord,
    RatingLog,
    CommunityRating,
    TargetRating,
    Movie,
    Catalog,
};
