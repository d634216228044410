//! Error types
//!
//! Absence of a field is never an error here; extractors return `Option`.
//! These types cover real I/O: fetching, translation backends, export and
//! configuration.

use thiserror::Error;

/// Failure to obtain a page body
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("body of {url} could not be read: {reason}")]
    Body { url: String, reason: String },

    #[error("body of {url} too short ({len} bytes)")]
    TooShort { url: String, len: usize },

    #[error("body of {url} held no usable content")]
    NoContent { url: String },
}

/// Failure of a single translation backend
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{backend}: request failed: {reason}")]
    Transport { backend: String, reason: String },

    #[error("{backend}: unexpected response: {reason}")]
    Response { backend: String, reason: String },

    #[error("{backend}: returned empty output")]
    Empty { backend: String },

    #[error("{backend}: not configured")]
    NotConfigured { backend: String },
}

/// Failure to write batch output. Fatal for the batch.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unsupported language code '{0}'")]
    UnknownLanguage(String),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read URL list {path}: {source}")]
    UrlList {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
