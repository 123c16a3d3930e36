//! Error types for data loading and year selection.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a data load. Any of these moves the view into its failed state.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A source file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table could not be parsed as CSV
    #[error("failed to parse table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The boundary file is not valid GeoJSON
    #[error("invalid GeoJSON in {}: {message}", path.display())]
    GeoJson { path: PathBuf, message: String },

    /// The boundary file is GeoJSON but not a FeatureCollection
    #[error("{} is not a GeoJSON FeatureCollection", path.display())]
    NotFeatureCollection { path: PathBuf },

    /// The background load task ended without reporting a result
    #[error("data load task failed: {0}")]
    TaskFailed(String),
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn geojson(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::GeoJson {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// A year outside the range covered by the expenditure table.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum YearError {
    #[error("year {0} is outside 1960..=2020")]
    OutOfRange(i64),
}
