//! Runtime configuration for the trigger fetcher.
//!
//! ```rust
//! use fetcher::{FetcherConfig, WebDebugKeyPolicy};
//!
//! let config = FetcherConfig {
//!     max_redirect_hops: 5,
//!     web_debug_key_policy: WebDebugKeyPolicy::Either,
//!     ..FetcherConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validate::{LimitsError, ValidationLimits};

/// How a web job's debug key permission combines the ad-id permission with
/// the per-hop debug flag. App jobs always use the ad-id permission alone.
///
/// Only `RequireBoth` and `AdIdOnly` guarantee that a debug key never leaves
/// without ad-id permission. `TargetOnly` and `Either` can emit one on the
/// hop flag alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebDebugKeyPolicy {
    /// Both the ad-id permission and the hop's flag are required.
    #[default]
    RequireBoth,
    /// Only the hop's flag matters.
    TargetOnly,
    /// Only the ad-id permission matters.
    AdIdOnly,
    /// Either one is enough.
    Either,
}

impl WebDebugKeyPolicy {
    pub fn permits(self, ad_id_permission: bool, hop_flag: bool) -> bool {
        match self {
            Self::RequireBoth => ad_id_permission && hop_flag,
            Self::TargetOnly => hop_flag,
            Self::AdIdOnly => ad_id_permission,
            Self::Either => ad_id_permission || hop_flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Field bounds applied to every payload.
    pub limits: ValidationLimits,

    /// Response header volume above which the size metric also reports the
    /// ad-tech domain. Never blocks parsing.
    pub max_response_payload_bytes: usize,

    pub connect_timeout_ms: u64,

    /// Deadline for the whole exchange once a hop's request is issued.
    pub read_timeout_ms: u64,

    /// Requests allowed after the first one. Redirect targets past this bound
    /// are recorded but not fetched.
    pub max_redirect_hops: usize,

    pub web_debug_key_policy: WebDebugKeyPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            max_response_payload_bytes: 16 * 1024,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 5_000,
            max_redirect_hops: 20,
            web_debug_key_policy: WebDebugKeyPolicy::default(),
        }
    }
}

/// Inconsistent [`FetcherConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Limits(#[from] LimitsError),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("max_redirect_hops must be greater than zero")]
    ZeroRedirectHops,

    #[error("max_response_payload_bytes must be greater than zero")]
    ZeroResponsePayloadBytes,
}

impl FetcherConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Checks the configuration once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connect_timeout_ms"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("read_timeout_ms"));
        }
        if self.max_redirect_hops == 0 {
            return Err(ConfigError::ZeroRedirectHops);
        }
        if self.max_response_payload_bytes == 0 {
            return Err(ConfigError::ZeroResponsePayloadBytes);
        }
        Ok(())
    }
}
