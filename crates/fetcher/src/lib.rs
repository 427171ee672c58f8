//! Attribution trigger registration fetcher
//!
//! This is where registrations enter the pipeline. An ad-tech server is asked
//! for its registration over HTTPS, its `Attribution-Reporting-Register-Trigger`
//! header is validated field by field, and a normalized [`TriggerRecord`]
//! comes out, or a typed [`FetchStatus`] saying why not.
//!
//! ## What we do here
//!
//! - **Gate the request** - https only, and the registration host must be
//!   enrolled. Both checks happen before any I/O.
//! - **Follow the chain** - `Attribution-Reporting-Redirect` targets on
//!   accepted hops are recorded and fetched, up to a hop bound. The first
//!   accepted payload wins.
//! - **Validate adversarial input** - the far end is untrusted. Field rules
//!   live in the `validate` crate; see there for which fields drop and which
//!   reject.
//! - **Report** - a response-size metric per hop, a status counter per job,
//!   and structured `tracing` events throughout.
//!
//! ## Main entry point
//!
//! Build a [`TriggerFetcher`] with its collaborators and call
//! [`TriggerFetcher::fetch`] per [`RegistrationJob`]. The returned
//! [`FetchReport`] carries the outcome and the redirect list.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use fetcher::{
//!     FetchStatus, FetcherConfig, HopResponse, NoopMetrics, RegistrationJob, RegistrationKind,
//!     RegistrationTransport, ResponseHeaders, StaticEnrollmentDirectory, TransportError,
//!     TriggerFetcher, REGISTER_TRIGGER_HEADER,
//! };
//! use url::Url;
//!
//! /// Answers every request with the same registration.
//! struct Canned;
//!
//! #[async_trait]
//! impl RegistrationTransport for Canned {
//!     async fn post(&self, _url: &Url) -> Result<HopResponse, TransportError> {
//!         Ok(HopResponse {
//!             status: 200,
//!             headers: ResponseHeaders::new().with(
//!                 REGISTER_TRIGGER_HEADER,
//!                 r#"{"event_trigger_data":[{"trigger_data":"2"}]}"#,
//!             ),
//!         })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fetcher = TriggerFetcher::new(
//!     FetcherConfig::default(),
//!     Arc::new(Canned),
//!     Arc::new(StaticEnrollmentDirectory::new().with_enrollment("foo.com", "enrollment-id")),
//!     Arc::new(NoopMetrics),
//! )
//! .unwrap();
//!
//! let job = RegistrationJob::new(
//!     RegistrationKind::AppTrigger,
//!     Url::parse("https://foo.com").unwrap(),
//!     Url::parse("android-app://com.example").unwrap(),
//! );
//! let report = fetcher.fetch(&job).await;
//! assert_eq!(report.status(), FetchStatus::Success);
//! assert_eq!(
//!     report.outcome.record().unwrap().event_trigger_data(),
//!     r#"[{"trigger_data":"2"}]"#
//! );
//! # }
//! ```
mod config;
mod destination;
mod driver;
mod enrollment;
mod error;
mod header;
mod metrics;
mod status;
mod transport;
mod trigger;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::config::{ConfigError, FetcherConfig, WebDebugKeyPolicy};
pub use crate::destination::{debug_key_decision, resolve_attribution_destination, DebugKeyDecision};
pub use crate::driver::TriggerFetcher;
pub use crate::enrollment::{EnrollmentId, EnrollmentResolver, StaticEnrollmentDirectory};
pub use crate::error::{FetchError, TransportError};
pub use crate::header::{
    extract_payload, header_byte_size, redirect_targets, report_response_size, REDIRECT_HEADER,
    REGISTER_TRIGGER_HEADER,
};
pub use crate::metrics::{
    MetricsRecorder, NoopMetrics, RegistrationMetrics, FETCH_STATUS_TOTAL, OVERSIZED_TOTAL,
    RESPONSE_BYTES,
};
pub use crate::status::{FetchFailure, FetchOutcome, FetchReport, FetchStatus};
pub use crate::transport::{HopResponse, RegistrationTransport, ReqwestTransport, ResponseHeaders};
pub use crate::trigger::{assemble_trigger, Rejection, TriggerContext};
pub use crate::types::{
    DebugKeyAllowance, DestinationType, RedirectList, RegistrationJob, RegistrationKind,
    SourceType, TriggerRecord, WebDebugFlag,
};

pub use validate::{ValidationError, ValidationLimits};
