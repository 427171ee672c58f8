//! HTTP exchange for a single hop.
//!
//! The driver only needs the status code and the response headers; bodies are
//! never read. [`RegistrationTransport`] is the seam tests replace with a
//! scripted fake, and [`ReqwestTransport`] is the production client.
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::redirect;
use url::Url;

use crate::config::FetcherConfig;
use crate::error::{FetchError, TransportError};

/// Response headers in arrival order, with case-insensitive lookup.
///
/// A name may appear more than once; duplicates are kept as separate
/// entries so callers can tell one value from many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Every value sent under `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&HeaderMap> for ResponseHeaders {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            headers.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        headers
    }
}

/// Status line and headers of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
}

/// Issues the registration POST for one hop.
///
/// Implementations must not follow redirects themselves; the redirect chain
/// is driven by registration headers, not HTTP `Location`.
#[async_trait]
pub trait RegistrationTransport: Send + Sync {
    async fn post(&self, url: &Url) -> Result<HopResponse, TransportError>;
}

/// [`RegistrationTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.read_timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(redirect::Policy::none())
            .https_only(true)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RegistrationTransport for ReqwestTransport {
    async fn post(&self, url: &Url) -> Result<HopResponse, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(classify)?;
        // The body is never read; dropping the response releases the
        // connection.
        Ok(HopResponse {
            status: response.status().as_u16(),
            headers: ResponseHeaders::from(response.headers()),
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    #[test]
    fn lookup_ignores_case_and_keeps_duplicates() {
        let headers = ResponseHeaders::new()
            .with("Attribution-Reporting-Redirect", "https://a.com")
            .with("content-type", "text/plain")
            .with("attribution-reporting-redirect", "https://b.com");

        let values: Vec<&str> = headers.get_all("ATTRIBUTION-REPORTING-REDIRECT").collect();
        assert_eq!(values, vec!["https://a.com", "https://b.com"]);
        assert_eq!(headers.get_all("missing").count(), 0);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn converts_from_header_map() {
        let mut map = HeaderMap::new();
        map.append(
            HeaderName::from_static("attribution-reporting-redirect"),
            HeaderValue::from_static("https://a.com"),
        );
        map.append(
            HeaderName::from_static("attribution-reporting-redirect"),
            HeaderValue::from_static("https://b.com"),
        );
        let headers = ResponseHeaders::from(&map);
        assert_eq!(
            headers
                .get_all("Attribution-Reporting-Redirect")
                .collect::<Vec<_>>(),
            vec!["https://a.com", "https://b.com"]
        );
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(ReqwestTransport::new(&FetcherConfig::default()).is_ok());
    }
}
