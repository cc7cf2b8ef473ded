use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the metrics engine.
///
/// Everything except [`DataError::InvalidYearRange`] is fatal for the
/// request that produced it; nothing here is retried.
#[derive(Debug, Error)]
pub enum DataError {
    /// A source file is missing, unreadable or not parseable in its format.
    #[error("data source not found or unreadable: {path}: {message}")]
    DataNotFound { path: PathBuf, message: String },

    /// A source was read but lacks a required column.
    #[error("{source_name}: missing required column '{column}'")]
    MalformedSchema { source_name: String, column: String },

    /// A required cell could not be interpreted.
    #[error("{source_name}, row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// Two rows share one (entity, year) key.
    #[error("duplicate observation for entity '{entity}' in year {year}")]
    DuplicateKey { entity: String, year: i32 },

    #[error("invalid year range: {min} > {max}")]
    InvalidYearRange { min: i32, max: i32 },

    #[error("configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("export failed: {0}")]
    Export(String),
}

impl DataError {
    pub fn not_found(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::DataNotFound {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn missing_column(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MalformedSchema {
            source_name: source_name.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        source_name: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            source_name: source_name.into(),
            row,
            column: column.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
