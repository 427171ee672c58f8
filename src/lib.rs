//! `arfetch`: fetch and validate attribution trigger registrations.
//!
//! This crate wires the `fetcher` and `validate` workspace crates into a
//! runnable tool. It loads layered configuration, installs the tracing
//! subscriber, builds a [`TriggerFetcher`] on the `reqwest` transport, and
//! reads registration jobs from JSON files.
//!
//! Library users who bring their own transport or enrollment source should
//! depend on `fetcher` directly; everything it exports is re-exported here.

pub mod config;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub use crate::config::{AppConfig, ConfigLoadError, EnrollmentEntry};
pub use fetcher::{
    DebugKeyAllowance, DebugKeyDecision, DestinationType, EnrollmentId, EnrollmentResolver,
    FetchError, FetchFailure, FetchOutcome, FetchReport, FetchStatus, FetcherConfig, HopResponse,
    MetricsRecorder, NoopMetrics, RedirectList, RegistrationJob, RegistrationKind,
    RegistrationMetrics, RegistrationTransport, ReqwestTransport, ResponseHeaders, SourceType,
    StaticEnrollmentDirectory, TransportError, TriggerFetcher, TriggerRecord, WebDebugKeyPolicy,
    assemble_trigger, debug_key_decision, resolve_attribution_destination,
};
pub use validate::{ValidationError, ValidationLimits};

/// Errors reading a registration job file.
#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("failed to read job file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("job file {path} is not a valid registration job: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when set. Fails if a subscriber
/// is already installed.
pub fn init_tracing(config: &AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Builds a fetcher on the `reqwest` transport, with the configured
/// enrollments and the `metrics` facade recorder.
pub fn build_fetcher(config: &AppConfig) -> Result<TriggerFetcher, FetchError> {
    TriggerFetcher::with_reqwest(
        config.fetcher.clone(),
        Arc::new(config.enrollment_directory()),
        Arc::new(MetricsRecorder),
    )
}

/// Reads one [`RegistrationJob`] from a JSON file.
pub fn read_job(path: &Path) -> Result<RegistrationJob, JobFileError> {
    let raw = fs::read_to_string(path).map_err(|source| JobFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_job(&raw).map_err(|source| JobFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses one [`RegistrationJob`] from JSON text.
pub fn parse_job(raw: &str) -> Result<RegistrationJob, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_job() {
        let job = parse_job(
            r#"{
                "kind": "APP_TRIGGER",
                "registration_uri": "https://foo.com/register",
                "registrant": "android-app://com.example"
            }"#,
        )
        .unwrap();
        assert_eq!(job.kind, RegistrationKind::AppTrigger);
        assert_eq!(job.registration_uri.as_str(), "https://foo.com/register");
        assert!(!job.redirects_enabled);
        assert_eq!(job.retry_count, 0);
    }

    #[test]
    fn missing_job_file_is_io_error() {
        let err = read_job(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, JobFileError::Io { .. }));
    }

    #[test]
    fn build_fetcher_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.fetcher.max_redirect_hops = 0;
        assert!(build_fetcher(&config).is_err());
    }
}
