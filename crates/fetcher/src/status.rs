//! Fetch outcomes handed back to the caller.
//!
//! [`FetchOutcome`] ties the record to the status: only `Success` carries
//! one, so a record without a success (or the reverse) cannot be expressed.
use std::fmt;

use serde::{Deserialize, Serialize};
use validate::ValidationError;

use crate::error::TransportError;
use crate::types::RedirectList;

/// Status of a fetch, as reported to the job scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Success,
    NetworkError,
    ServerUnavailable,
    ParsingError,
    InvalidEnrollment,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ServerUnavailable => "SERVER_UNAVAILABLE",
            Self::ParsingError => "PARSING_ERROR",
            Self::InvalidEnrollment => "INVALID_ENROLLMENT",
        }
    }

    /// Maps a non-2xx HTTP status. 4xx means the server answered and refused;
    /// anything else is treated as the network failing us.
    pub fn from_http_status(code: u16) -> Option<Self> {
        FetchFailure::from_http_status(code).map(Self::from)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ValidationError> for FetchStatus {
    fn from(error: &ValidationError) -> Self {
        FetchFailure::from(error).into()
    }
}

impl From<&TransportError> for FetchStatus {
    fn from(error: &TransportError) -> Self {
        FetchFailure::from(error).into()
    }
}

/// The failing subset of [`FetchStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchFailure {
    NetworkError,
    ServerUnavailable,
    ParsingError,
    InvalidEnrollment,
}

impl FetchFailure {
    /// `None` for 2xx.
    pub fn from_http_status(code: u16) -> Option<Self> {
        match code {
            200..=299 => None,
            400..=499 => Some(Self::ServerUnavailable),
            _ => Some(Self::NetworkError),
        }
    }

    pub fn status(self) -> FetchStatus {
        self.into()
    }
}

impl From<FetchFailure> for FetchStatus {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::NetworkError => Self::NetworkError,
            FetchFailure::ServerUnavailable => Self::ServerUnavailable,
            FetchFailure::ParsingError => Self::ParsingError,
            FetchFailure::InvalidEnrollment => Self::InvalidEnrollment,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

impl From<&ValidationError> for FetchFailure {
    fn from(_: &ValidationError) -> Self {
        Self::ParsingError
    }
}

impl From<&TransportError> for FetchFailure {
    fn from(_: &TransportError) -> Self {
        Self::NetworkError
    }
}

/// Result of one fetch invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchOutcome<R> {
    Success(R),
    NetworkError,
    ServerUnavailable,
    ParsingError,
    InvalidEnrollment,
}

impl<R> FetchOutcome<R> {
    pub fn failure(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::NetworkError => Self::NetworkError,
            FetchFailure::ServerUnavailable => Self::ServerUnavailable,
            FetchFailure::ParsingError => Self::ParsingError,
            FetchFailure::InvalidEnrollment => Self::InvalidEnrollment,
        }
    }

    pub fn status(&self) -> FetchStatus {
        match self {
            Self::Success(_) => FetchStatus::Success,
            Self::NetworkError => FetchStatus::NetworkError,
            Self::ServerUnavailable => FetchStatus::ServerUnavailable,
            Self::ParsingError => FetchStatus::ParsingError,
            Self::InvalidEnrollment => FetchStatus::InvalidEnrollment,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn record(&self) -> Option<&R> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<R> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }
}

/// Everything one invocation produced: the outcome, the redirects seen on
/// accepted hops, and how many requests were attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchReport<R> {
    pub outcome: FetchOutcome<R>,
    pub redirects: RedirectList,
    pub hops: usize,
}

impl<R> FetchReport<R> {
    pub fn status(&self) -> FetchStatus {
        self.outcome.status()
    }
}
