//! Declarative description of a single request target.
//!
//! # Design
//! `EndpointDescriptor` is a plain value: every field not set explicitly
//! resolves to a library default, and nothing is validated until the
//! descriptor is turned into a request by [`crate::request::build`]. Setters
//! consume and return the descriptor so application code can declare an
//! endpoint in one expression.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::http::HttpMethod;

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Cache hint forwarded to the transport untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CachePolicy {
    /// Follow whatever the protocol's caching headers say.
    #[default]
    UseProtocolCachePolicy,
    ReloadIgnoringLocalCacheData,
    ReturnCacheDataElseLoad,
    ReturnCacheDataDontLoad,
}

impl CachePolicy {
    /// The `Cache-Control` request directive equivalent to this hint, for
    /// transports without a local cache of their own.
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            CachePolicy::UseProtocolCachePolicy => None,
            CachePolicy::ReloadIgnoringLocalCacheData => Some("no-cache"),
            CachePolicy::ReturnCacheDataElseLoad => Some("max-stale"),
            CachePolicy::ReturnCacheDataDontLoad => Some("only-if-cached"),
        }
    }
}

/// Everything needed to issue one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub scheme: String,
    pub host: String,
    pub path: String,
    /// Ordered `(name, value)` pairs; `None` means no query string.
    pub query: Option<Vec<(String, String)>>,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub cache_policy: CachePolicy,
    pub timeout: Duration,
    /// Upper bound on transport attempts, including the first one.
    pub max_attempts: u32,
}

impl EndpointDescriptor {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: host.into(),
            path: path.into(),
            query: None,
            method: HttpMethod::default(),
            headers: default_headers(),
            cache_policy: CachePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Append a query parameter, creating the query if there was none.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    /// Insert or replace a single header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace the whole header map, dropping the defaults.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}
