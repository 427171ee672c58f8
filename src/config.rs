//! Layered application configuration for the `arfetch` binary.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. a config file: the path given on the command line, or `arfetch.toml` /
//!    `arfetch.yaml` / `arfetch.json` in the working directory if present
//! 3. `ARFETCH__*` environment variables, with `__` separating nested keys
//!    (`ARFETCH__FETCHER__MAX_REDIRECT_HOPS=5`)
//!
//! ## Example file
//!
//! ```toml
//! log_level = "debug"
//! log_json = false
//!
//! [fetcher]
//! max_redirect_hops = 5
//! web_debug_key_policy = "either"
//!
//! [fetcher.limits]
//! max_event_trigger_data = 10
//!
//! [[enrollments]]
//! host = "foo.com"
//! enrollment_id = "enrollment-id"
//! ```
use std::path::Path;

use fetcher::{ConfigError, FetcherConfig, StaticEnrollmentDirectory};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "ARFETCH";
pub const DEFAULT_CONFIG_NAME: &str = "arfetch";

/// Errors that can occur when loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid fetcher configuration: {0}")]
    Fetcher(#[from] ConfigError),

    #[error("enrollment entry {index} has an empty {field}")]
    EmptyEnrollment { index: usize, field: &'static str },
}

/// One enrolled registration host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentEntry {
    pub host: String,
    pub enrollment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default = "default_true")]
    pub log_json: bool,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Hosts allowed to register, with their enrollment ids.
    #[serde(default)]
    pub enrollments: Vec<EnrollmentEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: default_true(),
            fetcher: FetcherConfig::default(),
            enrollments: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the file (if any) and the process
    /// environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigLoadError> {
        Self::load_with_env(file, Self::environment())
    }

    /// The `ARFETCH__*` environment source.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    /// Loads the configuration with an explicit environment source.
    pub fn load_with_env(
        file: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, ConfigLoadError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: AppConfig = config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.fetcher.validate()?;
        for (index, entry) in self.enrollments.iter().enumerate() {
            if entry.host.trim().is_empty() {
                return Err(ConfigLoadError::EmptyEnrollment {
                    index,
                    field: "host",
                });
            }
            if entry.enrollment_id.trim().is_empty() {
                return Err(ConfigLoadError::EmptyEnrollment {
                    index,
                    field: "enrollment_id",
                });
            }
        }
        Ok(())
    }

    /// Builds the enrollment directory described by `enrollments`.
    pub fn enrollment_directory(&self) -> StaticEnrollmentDirectory {
        self.enrollments
            .iter()
            .map(|entry| (entry.host.as_str(), entry.enrollment_id.clone()))
            .collect()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcher::EnrollmentResolver;
    use url::Url;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.log_json);
        assert_eq!(cfg.fetcher.max_redirect_hops, 20);
        assert!(cfg.enrollments.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_enrollment_fields_are_rejected() {
        let cfg = AppConfig {
            enrollments: vec![EnrollmentEntry {
                host: " ".into(),
                enrollment_id: "id".into(),
            }],
            ..AppConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigLoadError::EmptyEnrollment { index: 0, field: "host" })
        ));
    }

    #[test]
    fn directory_is_built_from_entries() {
        let cfg = AppConfig {
            enrollments: vec![EnrollmentEntry {
                host: "foo.com".into(),
                enrollment_id: "enrollment-id".into(),
            }],
            ..AppConfig::default()
        };
        let directory = cfg.enrollment_directory();
        let id = directory.lookup(&Url::parse("https://foo.com/x").unwrap());
        assert_eq!(id.map(|id| id.to_string()), Some("enrollment-id".to_string()));
    }
}
