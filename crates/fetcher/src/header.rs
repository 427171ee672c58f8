//! Registration headers: payload extraction, redirect targets and the
//! response-size metric.
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::metrics::RegistrationMetrics;
use crate::transport::ResponseHeaders;
use crate::types::RegistrationKind;

pub const REGISTER_TRIGGER_HEADER: &str = "Attribution-Reporting-Register-Trigger";
pub const REDIRECT_HEADER: &str = "Attribution-Reporting-Redirect";

/// Returns the trigger payload when the header is present exactly once and
/// holds a JSON object.
///
/// Absence, duplicates, malformed JSON and non-object JSON all mean "no
/// payload".
pub fn extract_payload(headers: &ResponseHeaders) -> Option<Map<String, Value>> {
    let mut values = headers.get_all(REGISTER_TRIGGER_HEADER);
    let (Some(raw), None) = (values.next(), values.next()) else {
        debug!("register-trigger header missing or repeated");
        return None;
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(payload)) => Some(payload),
        Ok(_) => {
            debug!("register-trigger header is not a json object");
            None
        }
        Err(err) => {
            debug!(error = %err, "register-trigger header is not valid json");
            None
        }
    }
}

/// Redirect targets announced by a response, in order. Values that are not
/// absolute URLs are skipped.
pub fn redirect_targets(headers: &ResponseHeaders) -> Vec<Url> {
    headers
        .get_all(REDIRECT_HEADER)
        .filter_map(|raw| match Url::parse(raw.trim()) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(error = %err, "unparseable redirect target skipped");
                None
            }
        })
        .collect()
}

/// Summed byte length of every header name and value.
pub fn header_byte_size(headers: &ResponseHeaders) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.len() + value.len())
        .sum()
}

/// Reports the response size for one hop. The ad-tech domain (the hop's
/// origin) is attached only when `max_bytes` is exceeded.
pub fn report_response_size(
    metrics: &dyn RegistrationMetrics,
    kind: RegistrationKind,
    headers: &ResponseHeaders,
    hop_uri: &Url,
    max_bytes: usize,
) -> usize {
    let size = header_byte_size(headers);
    if size > max_bytes {
        let domain = hop_uri.origin().ascii_serialization();
        metrics.record_response_size(kind, size, Some(&domain));
    } else {
        metrics.record_response_size(kind, size, None);
    }
    size
}
