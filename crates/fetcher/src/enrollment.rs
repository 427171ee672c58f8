//! Enrollment lookup: which ad-tech, if any, is authorized to register from
//! a given host.
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Identifier of an enrolled ad-tech.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(String);

impl EnrollmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory of enrolled registration servers.
///
/// The fetcher calls this once per job, before any network I/O, with the
/// registration URI stripped of its query and fragment.
pub trait EnrollmentResolver: Send + Sync {
    fn lookup(&self, url: &Url) -> Option<EnrollmentId>;
}

/// In-memory directory keyed by lowercase host.
#[derive(Debug, Clone, Default)]
pub struct StaticEnrollmentDirectory {
    by_host: HashMap<String, EnrollmentId>,
}

impl StaticEnrollmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enrollment(mut self, host: &str, id: impl Into<String>) -> Self {
        self.insert(host, id);
        self
    }

    pub fn insert(&mut self, host: &str, id: impl Into<String>) {
        self.by_host
            .insert(host.to_ascii_lowercase(), EnrollmentId::new(id));
    }

    pub fn len(&self) -> usize {
        self.by_host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_host.is_empty()
    }
}

impl<H: AsRef<str>, I: Into<String>> FromIterator<(H, I)> for StaticEnrollmentDirectory {
    fn from_iter<T: IntoIterator<Item = (H, I)>>(iter: T) -> Self {
        let mut directory = Self::new();
        for (host, id) in iter {
            directory.insert(host.as_ref(), id);
        }
        directory
    }
}

impl EnrollmentResolver for StaticEnrollmentDirectory {
    fn lookup(&self, url: &Url) -> Option<EnrollmentId> {
        let host = url.host_str()?;
        self.by_host.get(&host.to_ascii_lowercase()).cloned()
    }
}

/// Drops the query and fragment, which carry per-request data rather than
/// identity.
pub(crate) fn enrollment_key(url: &Url) -> Url {
    let mut key = url.clone();
    key.set_query(None);
    key.set_fragment(None);
    key
}
