use std::sync::Arc;

use thiserror::Error;

/// A single source document could not be fetched or parsed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-audience or per-source failure during a load pass.
///
/// These are logged where they happen and never abort the pass.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Arc<FetchError>,
    },
    #[error("invalid catalog configuration structure for {audience_group}")]
    ConfigStructure { audience_group: String },
}

/// Failure of a whole load pass.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load any catalog configurations ({attempted} audience groups attempted)")]
    TotalConfigFailure { attempted: usize },
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}
