//! Core data model for the registration fetch pipeline.
//!
//! ```text
//! RegistrationJob  (read-only input, owned by the caller's queue)
//! ├── id, kind, registration_uri, registrant
//! ├── os_destination / web_destination / verified_destination / top_origin
//! ├── requested_at, retry_count, last_processed_at
//! ├── redirects_enabled
//! ├── debug_key_allowed: DebugKeyAllowance
//! └── ad_id_permission
//!
//!         ↓ TriggerFetcher::fetch()
//!
//! FetchReport<TriggerRecord>
//! ├── outcome: FetchOutcome  (Success(record) | NetworkError | ...)
//! ├── redirects: RedirectList
//! └── hops
//! ```
//!
//! Jobs deserialize from JSON with defaults for everything except the kind
//! and the two URIs, which is how the CLI reads them from disk.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::enrollment::EnrollmentId;

/// Which registration flow a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationKind {
    AppSource,
    AppTrigger,
    WebSource,
    WebTrigger,
}

impl RegistrationKind {
    pub fn is_web(self) -> bool {
        matches!(self, Self::WebSource | Self::WebTrigger)
    }

    pub fn is_trigger(self) -> bool {
        matches!(self, Self::AppTrigger | Self::WebTrigger)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppSource => "app_source",
            Self::AppTrigger => "app_trigger",
            Self::WebSource => "web_source",
            Self::WebTrigger => "web_trigger",
        }
    }
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-type hint carried by source registrations. Trigger jobs leave it
/// unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Navigation,
    Event,
}

/// Permission for a registration server to attach a debug key.
///
/// App jobs carry a single flag. Web jobs carry one flag per registration
/// URI, since each hop of a web chain is a different server; a hop that is
/// not listed is not allowed.
///
/// Serialized untagged: `true` or `[{"uri": "...", "allowed": true}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugKeyAllowance {
    Flag(bool),
    PerUri(Vec<WebDebugFlag>),
}

impl Default for DebugKeyAllowance {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl DebugKeyAllowance {
    /// Resolves the flag for the hop that produced a payload.
    pub fn allowed_for(&self, hop_uri: &Url) -> bool {
        match self {
            Self::Flag(allowed) => *allowed,
            Self::PerUri(flags) => flags
                .iter()
                .find(|flag| flag.uri == *hop_uri)
                .is_some_and(|flag| flag.allowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebDebugFlag {
    pub uri: Url,
    pub allowed: bool,
}

/// One pending registration, as handed over by the scheduler.
///
/// The pipeline never mutates a job; retry bookkeeping stays with the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationJob {
    #[serde(default = "generate_job_id")]
    pub id: String,

    pub kind: RegistrationKind,

    /// First hop of the chain. Must be `https`.
    pub registration_uri: Url,

    /// App package or web page that asked for the registration.
    pub registrant: Url,

    #[serde(default)]
    pub verified_destination: Option<Url>,

    #[serde(default)]
    pub os_destination: Option<Url>,

    #[serde(default)]
    pub web_destination: Option<Url>,

    /// Origin of the page a web registration happened on.
    #[serde(default)]
    pub top_origin: Option<Url>,

    #[serde(default)]
    pub source_type: Option<SourceType>,

    #[serde(default = "Utc::now")]
    pub requested_at: DateTime<Utc>,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default)]
    pub last_processed_at: Option<DateTime<Utc>>,

    /// Whether redirect headers are honored. When false the redirect list
    /// stays empty and only the first hop is fetched.
    #[serde(default)]
    pub redirects_enabled: bool,

    #[serde(default)]
    pub debug_key_allowed: DebugKeyAllowance,

    #[serde(default)]
    pub ad_id_permission: bool,
}

fn generate_job_id() -> String {
    Uuid::new_v4().to_string()
}

impl RegistrationJob {
    /// Creates a job with a fresh id, the current time, and every optional
    /// field unset.
    pub fn new(kind: RegistrationKind, registration_uri: Url, registrant: Url) -> Self {
        Self {
            id: generate_job_id(),
            kind,
            registration_uri,
            registrant,
            verified_destination: None,
            os_destination: None,
            web_destination: None,
            top_origin: None,
            source_type: None,
            requested_at: Utc::now(),
            retry_count: 0,
            last_processed_at: None,
            redirects_enabled: false,
            debug_key_allowed: DebugKeyAllowance::default(),
            ad_id_permission: false,
        }
    }

    pub fn destination_type(&self) -> DestinationType {
        if self.kind.is_web() {
            DestinationType::Web
        } else {
            DestinationType::App
        }
    }
}

/// Surface the attribution destination lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestinationType {
    App,
    Web,
}

/// A validated trigger registration.
///
/// Built only by the assembler after every all-or-nothing check passed, and
/// read-only afterwards. JSON-valued fields hold the normalized serialization
/// that downstream attribution consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerRecord {
    pub(crate) attribution_destination: Url,
    pub(crate) destination_type: DestinationType,
    pub(crate) enrollment_id: EnrollmentId,
    pub(crate) registrant: Url,
    pub(crate) trigger_time: DateTime<Utc>,
    pub(crate) event_trigger_data: String,
    pub(crate) aggregatable_trigger_data: Option<String>,
    pub(crate) aggregatable_values: Option<String>,
    pub(crate) aggregatable_deduplication_keys: Option<String>,
    pub(crate) filters: Option<String>,
    pub(crate) not_filters: Option<String>,
    pub(crate) debug_key: Option<u64>,
    pub(crate) debug_reporting: bool,
    pub(crate) ad_id_permission: bool,
    pub(crate) debug_permission: bool,
}

impl TriggerRecord {
    pub fn attribution_destination(&self) -> &Url {
        &self.attribution_destination
    }

    pub fn destination_type(&self) -> DestinationType {
        self.destination_type
    }

    pub fn enrollment_id(&self) -> &EnrollmentId {
        &self.enrollment_id
    }

    pub fn registrant(&self) -> &Url {
        &self.registrant
    }

    pub fn trigger_time(&self) -> DateTime<Utc> {
        self.trigger_time
    }

    /// Normalized `event_trigger_data`; `[]` when the payload had none.
    pub fn event_trigger_data(&self) -> &str {
        &self.event_trigger_data
    }

    pub fn aggregatable_trigger_data(&self) -> Option<&str> {
        self.aggregatable_trigger_data.as_deref()
    }

    pub fn aggregatable_values(&self) -> Option<&str> {
        self.aggregatable_values.as_deref()
    }

    pub fn aggregatable_deduplication_keys(&self) -> Option<&str> {
        self.aggregatable_deduplication_keys.as_deref()
    }

    pub fn filters(&self) -> Option<&str> {
        self.filters.as_deref()
    }

    pub fn not_filters(&self) -> Option<&str> {
        self.not_filters.as_deref()
    }

    pub fn debug_key(&self) -> Option<u64> {
        self.debug_key
    }

    pub fn debug_reporting(&self) -> bool {
        self.debug_reporting
    }

    pub fn ad_id_permission(&self) -> bool {
        self.ad_id_permission
    }

    /// The per-hop debug flag in effect when the payload was accepted.
    pub fn debug_permission(&self) -> bool {
        self.debug_permission
    }
}

/// Redirect targets discovered across one chain, in the order received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectList(Vec<Url>);

impl RedirectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, uri: Url) {
        self.0.push(uri);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Url> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Url] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Url> {
        self.0
    }
}

impl<'a> IntoIterator for &'a RedirectList {
    type Item = &'a Url;
    type IntoIter = std::slice::Iter<'a, Url>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn kind_classification() {
        assert!(RegistrationKind::WebTrigger.is_web());
        assert!(RegistrationKind::WebTrigger.is_trigger());
        assert!(!RegistrationKind::AppTrigger.is_web());
        assert!(!RegistrationKind::AppSource.is_trigger());
        assert_eq!(RegistrationKind::AppTrigger.to_string(), "app_trigger");
    }

    #[test]
    fn per_uri_debug_flags_default_to_denied() {
        let allowance = DebugKeyAllowance::PerUri(vec![
            WebDebugFlag {
                uri: url("https://foo.com/"),
                allowed: true,
            },
            WebDebugFlag {
                uri: url("https://bar.com/"),
                allowed: false,
            },
        ]);
        assert!(allowance.allowed_for(&url("https://foo.com/")));
        assert!(!allowance.allowed_for(&url("https://bar.com/")));
        assert!(!allowance.allowed_for(&url("https://baz.com/")));
        assert!(DebugKeyAllowance::Flag(true).allowed_for(&url("https://baz.com/")));
    }

    #[test]
    fn job_deserializes_with_defaults() {
        let job: RegistrationJob = serde_json::from_str(
            r#"{
                "kind": "WEB_TRIGGER",
                "registration_uri": "https://foo.com/register",
                "registrant": "android-app://com.example",
                "top_origin": "https://shop.example",
                "debug_key_allowed": [{"uri": "https://foo.com/register", "allowed": true}]
            }"#,
        )
        .unwrap();

        assert_eq!(job.kind, RegistrationKind::WebTrigger);
        assert!(!job.id.is_empty());
        assert!(!job.redirects_enabled);
        assert!(!job.ad_id_permission);
        assert_eq!(job.destination_type(), DestinationType::Web);
        assert!(job
            .debug_key_allowed
            .allowed_for(&url("https://foo.com/register")));
    }

    #[test]
    fn flag_form_debug_allowance_parses() {
        let job: RegistrationJob = serde_json::from_str(
            r#"{
                "kind": "APP_TRIGGER",
                "registration_uri": "https://foo.com",
                "registrant": "android-app://com.example",
                "debug_key_allowed": true
            }"#,
        )
        .unwrap();
        assert_eq!(job.debug_key_allowed, DebugKeyAllowance::Flag(true));
    }
}
