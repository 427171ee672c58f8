//! In-memory collaborators for exercising the fetcher without a network.
//!
//! Used by this crate's unit tests and by the workspace integration tests.
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::header::{REDIRECT_HEADER, REGISTER_TRIGGER_HEADER};
use crate::metrics::RegistrationMetrics;
use crate::status::FetchStatus;
use crate::transport::{HopResponse, RegistrationTransport, ResponseHeaders};
use crate::types::RegistrationKind;

enum Scripted {
    Respond(HopResponse),
    Fail(TransportError),
}

/// Transport that replays canned responses per URL and records every call.
///
/// A URL with nothing left in its script fails with a connect error, so an
/// unexpected request shows up as `NETWORK_ERROR` rather than a hang.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: HopResponse) -> Self {
        self.push(url, Scripted::Respond(response));
        self
    }

    pub fn fail(self, url: &str, error: TransportError) -> Self {
        self.push(url, Scripted::Fail(error));
        self
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn push(&self, url: &str, entry: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(normalize(url))
            .or_default()
            .push_back(entry);
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_owned())
}

#[async_trait]
impl RegistrationTransport for ScriptedTransport {
    async fn post(&self, url: &Url) -> Result<HopResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.clone());
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_mut(url.as_str())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(TransportError::Connect(format!(
                "no scripted response for {url}"
            ))),
        }
    }
}

/// One `record_response_size` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSizeSample {
    pub kind: RegistrationKind,
    pub byte_size: usize,
    pub ad_tech_domain: Option<String>,
}

/// Metrics sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct CapturingMetrics {
    sizes: Mutex<Vec<ResponseSizeSample>>,
    statuses: Mutex<Vec<(RegistrationKind, FetchStatus)>>,
}

impl CapturingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_sizes(&self) -> Vec<ResponseSizeSample> {
        self.sizes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn statuses(&self) -> Vec<(RegistrationKind, FetchStatus)> {
        self.statuses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RegistrationMetrics for CapturingMetrics {
    fn record_response_size(
        &self,
        kind: RegistrationKind,
        byte_size: usize,
        ad_tech_domain: Option<&str>,
    ) {
        self.sizes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ResponseSizeSample {
                kind,
                byte_size,
                ad_tech_domain: ad_tech_domain.map(str::to_owned),
            });
    }

    fn record_fetch_status(&self, kind: RegistrationKind, status: FetchStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((kind, status));
    }
}

/// A response with the given status and headers.
pub fn response(status: u16, headers: ResponseHeaders) -> HopResponse {
    HopResponse { status, headers }
}

/// A 200 response carrying `payload` in the register-trigger header.
pub fn trigger_response(payload: &str) -> HopResponse {
    response(
        200,
        ResponseHeaders::new().with(REGISTER_TRIGGER_HEADER, payload),
    )
}

/// A 200 response carrying `payload` and one redirect header per target.
pub fn trigger_response_with_redirects(payload: &str, targets: &[&str]) -> HopResponse {
    let mut headers = ResponseHeaders::new().with(REGISTER_TRIGGER_HEADER, payload);
    for target in targets {
        headers.append(REDIRECT_HEADER, *target);
    }
    response(200, headers)
}
