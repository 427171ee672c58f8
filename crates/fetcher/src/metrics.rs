// Metrics hooks for the fetcher.
//
// The driver reports through a `RegistrationMetrics` handed to it at
// construction, keeping instrumentation decoupled from any specific metrics
// backend. `MetricsRecorder` forwards to the `metrics` facade, so whichever
// exporter the binary installs picks the values up.
use crate::status::FetchStatus;
use crate::types::RegistrationKind;

/// Metrics observer for registration fetches.
pub trait RegistrationMetrics: Send + Sync {
    /// Record the header volume of one response.
    ///
    /// `byte_size` is the summed length of every header name and value.
    /// `ad_tech_domain` is only provided when the size exceeded the configured
    /// maximum.
    fn record_response_size(
        &self,
        kind: RegistrationKind,
        byte_size: usize,
        ad_tech_domain: Option<&str>,
    );

    /// Record the final status of one invocation.
    fn record_fetch_status(&self, _kind: RegistrationKind, _status: FetchStatus) {}
}

pub const RESPONSE_BYTES: &str = "arfetch_registration_response_bytes";
pub const OVERSIZED_TOTAL: &str = "arfetch_registration_oversized_total";
pub const FETCH_STATUS_TOTAL: &str = "arfetch_fetch_status_total";

/// Reports to the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl RegistrationMetrics for MetricsRecorder {
    fn record_response_size(
        &self,
        kind: RegistrationKind,
        byte_size: usize,
        ad_tech_domain: Option<&str>,
    ) {
        ::metrics::histogram!(RESPONSE_BYTES, "kind" => kind.as_str()).record(byte_size as f64);
        if let Some(domain) = ad_tech_domain {
            ::metrics::counter!(
                OVERSIZED_TOTAL,
                "kind" => kind.as_str(),
                "ad_tech_domain" => domain.to_owned()
            )
            .increment(1);
        }
    }

    fn record_fetch_status(&self, kind: RegistrationKind, status: FetchStatus) {
        ::metrics::counter!(
            FETCH_STATUS_TOTAL,
            "kind" => kind.as_str(),
            "status" => status.as_str()
        )
        .increment(1);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl RegistrationMetrics for NoopMetrics {
    fn record_response_size(&self, _: RegistrationKind, _: usize, _: Option<&str>) {}
}
