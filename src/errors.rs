// errors.rs
use thiserror::Error;

use crate::geo::EnrichError;
use crate::crawler::FetchError;

/// Errors that stop a call outright. Partial or missing listing data never
/// ends up here; it degrades to absent fields instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Enrich(#[from] EnrichError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Structurally required input is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown city code: {0}")]
    UnknownCity(String),

    #[error("City name is required for the {0} pipeline")]
    MissingCityName(String),

    #[error("Invalid selector for {field}: {message}")]
    InvalidSelector { field: String, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid setting {field}: {message}")]
    InvalidSetting { field: String, message: String },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Config IO error: {0}")]
    Io(String),
}

/// Failures writing or reading durable state (page store, run log, tables).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("XLSX error: {0}")]
    Xlsx(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Db(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Csv(err.to_string())
    }
}
