//! Error types for the data-loader crate.
//!
//! Only problems that make a whole input unusable are errors here. A single
//! bad row is not: the parsers drop it with a warning and keep going.

use thiserror::Error;

/// Errors that can occur while loading the rating tables and the catalog
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader failed in a way that affects the whole file
    /// (unreadable header, broken stream)
    #[error("CSV error in {file}: {reason}")]
    CsvError { file: String, reason: String },

    /// A required column is absent from the header row
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A required column appears more than once, so it is unclear which one to read
    #[error("Column '{column}' appears {count} times in {file}")]
    DuplicateColumn {
        file: String,
        column: String,
        count: usize,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

impl DataLoadError {
    /// Wrap a `csv::Error` with the name of the file being read.
    ///
    /// Open failures keep their `std::io::Error` so callers can tell a missing
    /// file apart from a malformed one.
    pub(crate) fn from_csv(file: &str, err: csv::Error) -> Self {
        let reason = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                DataLoadError::FileNotFound {
                    path: file.to_string(),
                }
            }
            csv::ErrorKind::Io(io) => DataLoadError::IoError(io),
            _ => DataLoadError::CsvError {
                file: file.to_string(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = DataLoadError::MissingColumn {
            file: "movie_data.csv".to_string(),
            column: "tmdb_id".to_string(),
        };
        assert_eq!(err.to_string(), "Missing column 'tmdb_id' in movie_data.csv");
    }

    #[test]
    fn test_not_found_is_mapped() {
        let err = csv::Reader::from_path("definitely/not/here.csv").unwrap_err();
        let mapped = DataLoadError::from_csv("here.csv", err);
        assert!(matches!(mapped, DataLoadError::FileNotFound { .. }));
    }
}
