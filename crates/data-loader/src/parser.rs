//! CSV ingestion for the three input tables.
//!
//! - community log: `user_id,movie_id,rating_val` (movie_id is a catalog slug)
//! - catalog: `movie_id,tmdb_id,movie_title,year_released`
//! - target export: `id,Rating`
//!
//! Extra columns are ignored. Exports scraped from the web are messy, so a
//! row that cannot be read (wrong field count, bad encoding, missing or
//! non-numeric values) is dropped with a warning instead of failing the load.
//! Only an unreadable file or header is an error.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// =============================================================================
// Raw row shapes
// =============================================================================
// Every field is optional so that a missing or garbled value becomes `None`
// and can be reported, instead of failing serde for the whole row.

#[derive(Debug, Deserialize)]
struct RawCommunityRating {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    movie_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    rating_val: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    movie_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    tmdb_id: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    movie_title: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year_released: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTargetRating {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    id: Option<f64>,
    #[serde(rename = "Rating", default, deserialize_with = "csv::invalid_option")]
    rating: Option<f64>,
}

// =============================================================================
// Public entry points
// =============================================================================

/// Parse the community rating log
pub fn parse_community_ratings(path: &Path) -> Result<Vec<CommunityRating>> {
    read_community_ratings(open(path)?, &file_label(path))
}

/// Parse the movie catalog
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    read_movies(open(path)?, &file_label(path))
}

/// Parse the target user's rating export
pub fn parse_target_ratings(path: &Path) -> Result<Vec<TargetRating>> {
    read_target_ratings(open(path)?, &file_label(path))
}

/// Read community ratings from any CSV source.
///
/// `file` is only used in log and error messages.
pub fn read_community_ratings<R: Read>(reader: R, file: &str) -> Result<Vec<CommunityRating>> {
    read_rows(
        reader,
        file,
        &["user_id", "movie_id", "rating_val"],
        |raw: RawCommunityRating| {
            let user_id = non_empty(raw.user_id).ok_or("missing user_id")?;
            let movie_slug = non_empty(raw.movie_id).ok_or("missing movie_id")?;
            let rating = raw
                .rating_val
                .filter(|r| r.is_finite())
                .ok_or("missing or non-numeric rating_val")?;
            Ok(CommunityRating {
                user_id,
                movie_slug,
                rating,
            })
        },
    )
}

/// Read the movie catalog from any CSV source.
pub fn read_movies<R: Read>(reader: R, file: &str) -> Result<Vec<Movie>> {
    read_rows(
        reader,
        file,
        &["movie_id", "tmdb_id", "movie_title"],
        |raw: RawMovie| {
            let slug = non_empty(raw.movie_id).ok_or("missing movie_id")?;
            let item_id = raw
                .tmdb_id
                .and_then(item_id_from_float)
                .ok_or("missing or invalid tmdb_id")?;
            let title = non_empty(raw.movie_title).ok_or("missing movie_title")?;
            let year = raw.year_released.and_then(year_from_float);
            Ok(Movie {
                item_id,
                slug,
                title,
                year,
            })
        },
    )
}

/// Read the target user's ratings from any CSV source.
pub fn read_target_ratings<R: Read>(reader: R, file: &str) -> Result<Vec<TargetRating>> {
    read_rows(reader, file, &["id", "Rating"], |raw: RawTargetRating| {
        let item_id = raw
            .id
            .and_then(item_id_from_float)
            .ok_or("missing or invalid id")?;
        let rating = raw
            .rating
            .filter(|r| r.is_finite())
            .ok_or("missing or non-numeric Rating")?;
        Ok(TargetRating { item_id, rating })
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Shared row loop: check the header, then deserialize and convert each row,
/// skipping (and logging) the ones that fail.
fn read_rows<R, Raw, T, F>(reader: R, file: &str, required: &[&str], convert: F) -> Result<Vec<T>>
where
    R: Read,
    Raw: DeserializeOwned,
    F: Fn(Raw) -> std::result::Result<T, &'static str>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataLoadError::from_csv(file, e))?
        .clone();
    check_columns(&headers, file, required)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1
        let fallback_line = idx as u64 + 2;

        let mut record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(DataLoadError::from_csv(file, e)),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                warn!(file, line, "Skipping unreadable row: {}", e);
                skipped += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);

        // Trailing empty columns are often cut off; serde needs one field per header
        while record.len() < headers.len() {
            record.push_field("");
        }

        let converted = record
            .deserialize::<Raw>(Some(&headers))
            .map_err(|_| "row does not match header")
            .and_then(&convert);

        match converted {
            Ok(row) => rows.push(row),
            Err(reason) => {
                warn!(file, line, "Skipping malformed row: {}", reason);
                skipped += 1;
            }
        }
    }

    debug!("Read {} rows from {} ({} skipped)", rows.len(), file, skipped);
    Ok(rows)
}

fn check_columns(headers: &csv::StringRecord, file: &str, required: &[&str]) -> Result<()> {
    for &column in required {
        let count = headers.iter().filter(|h| *h == column).count();
        match count {
            0 => {
                return Err(DataLoadError::MissingColumn {
                    file: file.to_string(),
                    column: column.to_string(),
                });
            }
            1 => {}
            _ => {
                return Err(DataLoadError::DuplicateColumn {
                    file: file.to_string(),
                    column: column.to_string(),
                    count,
                });
            }
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Ids are often exported as floats ("862.0") because the column had blanks
///
/// Example: 862.0 -> Some(862)
///          862.5 -> None
///          -1.0  -> None
fn item_id_from_float(value: f64) -> Option<ItemId> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as ItemId)
    } else {
        None
    }
}

fn year_from_float(value: f64) -> Option<u16> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u16::MAX as f64 {
        Some(value as u16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_from_float() {
        assert_eq!(item_id_from_float(862.0), Some(862));
        assert_eq!(item_id_from_float(0.0), Some(0));
        assert_eq!(item_id_from_float(862.5), None);
        assert_eq!(item_id_from_float(-1.0), None);
        assert_eq!(item_id_from_float(f64::NAN), None);
    }

    #[test]
    fn test_year_from_float() {
        assert_eq!(year_from_float(1972.0), Some(1972));
        assert_eq!(year_from_float(0.0), None);
        assert_eq!(year_from_float(1e9), None);
    }

    #[test]
    fn test_read_community_ratings() {
        let data = "\
user_id,movie_id,rating_val,_id
alice,the-godfather,9,abc
bob,heat,7,def
";
        let rows = read_community_ratings(data.as_bytes(), "ratings.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "alice");
        assert_eq!(rows[0].movie_slug, "the-godfather");
        assert_eq!(rows[0].rating, 9.0);
        assert_eq!(rows[1].movie_slug, "heat");
    }

    #[test]
    fn test_read_community_ratings_skips_malformed() {
        let data = "\
user_id,movie_id,rating_val
alice,the-godfather,9
,heat,7
bob,,7
carol,alien,not-a-number
dave,alien
erin,alien,8
";
        let rows = read_community_ratings(data.as_bytes(), "ratings.csv").unwrap();
        let users: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["alice", "erin"]);
    }

    #[test]
    fn test_read_movies_float_ids() {
        let data = "\
movie_id,tmdb_id,movie_title,year_released,genres
toy-story,862.0,Toy Story,1995.0,\"[\"\"Animation\"\"]\"
no-id,,Lost Movie,2001
heat,949,\"Heat, the movie\",
";
        let movies = read_movies(data.as_bytes(), "movie_data.csv").unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].item_id, 862);
        assert_eq!(movies[0].slug, "toy-story");
        assert_eq!(movies[0].year, Some(1995));
        assert_eq!(movies[1].title, "Heat, the movie");
        assert_eq!(movies[1].year, None);
    }

    #[test]
    fn test_short_rows_keep_required_columns() {
        let movies = "\
movie_id,tmdb_id,movie_title,year_released,genres
toy-story,862,Toy Story,1995,Animation
alien,348,Alien,1979
heat,949,Heat
the-matrix,603,The Matrix,1999,Action
";
        let movies = read_movies(movies.as_bytes(), "movie_data.csv").unwrap();
        let slugs: Vec<&str> = movies.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(slugs, vec!["toy-story", "alien", "heat", "the-matrix"]);
        assert_eq!(movies[1].year, Some(1979));
        assert_eq!(movies[2].year, None);

        let ratings = "\
user_id,movie_id,rating_val,_id
alice,heat,8
bob,alien,6,abc
carol,alien
";
        let ratings = read_community_ratings(ratings.as_bytes(), "ratings.csv").unwrap();
        let users: Vec<&str> = ratings.iter().map(|r| r.user_id.as_str()).collect();
        // carol has no rating at all and is still dropped
        assert_eq!(users, vec!["alice", "bob"]);
        assert_eq!(ratings[0].rating, 8.0);
    }

    #[test]
    fn test_read_target_ratings() {
        let data = "\
Date,Name,Year,id,Rating
2023-01-01,Heat,1995,949.0,4.5
2023-01-02,Alien,1979,348,0
2023-01-03,Broken,1999,,3
";
        let rows = read_target_ratings(data.as_bytes(), "target.csv").unwrap();
        // Zero ratings are kept here; the rating log drops them
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], TargetRating { item_id: 949, rating: 4.5 });
        assert_eq!(rows[1].rating, 0.0);
    }

    #[test]
    fn test_missing_column_is_error() {
        let data = "user_id,movie_id\nalice,heat\n";
        let err = read_community_ratings(data.as_bytes(), "ratings.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "rating_val"));
    }

    #[test]
    fn test_duplicate_column_is_error() {
        let data = "id,Rating,Rating\n1,4,5\n";
        let err = read_target_ratings(data.as_bytes(), "target.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn { count: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_movies(Path::new("no/such/movie_data.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
