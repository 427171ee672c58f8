//! Error types for the fetcher crate.
//!
//! Two families live here and they never mix:
//!
//! - [`TransportError`] describes one failed HTTP exchange. The driver folds
//!   it into a [`FetchStatus`](crate::FetchStatus) and keeps going; callers
//!   never see it as an `Err`.
//! - [`FetchError`] is a setup failure (bad configuration, HTTP client that
//!   cannot be built) surfaced when a fetcher is constructed.
use thiserror::Error;

use crate::config::ConfigError;

/// A request that did not produce an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Connect or read deadline elapsed. Not retried within the pipeline.
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Failure to build a fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    #[error("invalid fetcher configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("http client could not be built: {0}")]
    Client(String),
}
