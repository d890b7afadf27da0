//! Error taxonomy for the aggregation pipeline.
//!
//! Each error type belongs to one stage of the pipeline, and each stage
//! decides how far its errors travel:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`FetchError`] | transport, fetch orchestrator | recorded against the source name, never fatal |
//! | [`SeedError`] | bootstrap loader | logged, pipeline starts with no seed |
//! | [`StoreError`] | snapshot store `save` | returned to the caller |
//! | [`ConfigError`] | configuration loader | returned to `main` |
//!
//! Unreadable or corrupt persisted state has no error type: `load` treats it as
//! an empty store.

use std::path::PathBuf;
use std::time::Duration;

/// A single source could not be retrieved or yielded nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("malformed feed document: {0}")]
    Malformed(String),
}

/// Persisting the snapshot store failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write snapshot store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The bootstrap data file could not be obtained or decoded.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch seed file: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to decode seed file: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The source configuration is unreadable or invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_yaml::Error),

    #[error("invalid endpoint for source {name}: {source}")]
    Endpoint {
        name: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
