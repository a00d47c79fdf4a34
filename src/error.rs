//! Error types for loading favorites and locating the user.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while loading the feature collection.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("expected a FeatureCollection, got a {0}")]
    NotACollection(&'static str),
}

/// Errors produced by a location request.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("location lookup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("location service responded with {0}")]
    Status(StatusCode),

    #[error("location unavailable: {0}")]
    Unavailable(String),
}
