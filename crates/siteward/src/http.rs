//! # Request and Response Model
//!
//! This module defines the intercepted-request and stored-response types
//! that flow through the policy engine. Requests are read-only: the router
//! classifies them but never rewrites them.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use reqwest::{Method, StatusCode};
use url::Url;

/// Request mode, as reported by the hosting environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level navigation
    Navigate,
    /// Same-origin only
    SameOrigin,
    /// Cross-origin without CORS
    NoCors,
    /// Cross-origin with CORS
    Cors,
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMode::Navigate => write!(f, "navigate"),
            RequestMode::SameOrigin => write!(f, "same-origin"),
            RequestMode::NoCors => write!(f, "no-cors"),
            RequestMode::Cors => write!(f, "cors"),
        }
    }
}

/// Cache directive carried by the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCacheMode {
    /// Default HTTP cache behavior
    Default,
    /// Bypass the cache entirely
    NoStore,
    /// Always go to network, update the cache
    Reload,
    /// Validate with the network before using the cache
    NoCache,
    /// Use the cache regardless of freshness
    ForceCache,
    /// Only answer from cache, never the network
    OnlyIfCached,
}

impl std::fmt::Display for RequestCacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestCacheMode::Default => write!(f, "default"),
            RequestCacheMode::NoStore => write!(f, "no-store"),
            RequestCacheMode::Reload => write!(f, "reload"),
            RequestCacheMode::NoCache => write!(f, "no-cache"),
            RequestCacheMode::ForceCache => write!(f, "force-cache"),
            RequestCacheMode::OnlyIfCached => write!(f, "only-if-cached"),
        }
    }
}

/// A network request handed to the engine for classification
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    mode: RequestMode,
    cache_mode: RequestCacheMode,
}

impl InterceptedRequest {
    /// Create a new request with the given method
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            mode: RequestMode::Cors,
            cache_mode: RequestCacheMode::Default,
        }
    }

    /// Create a GET request for the given URL
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Attach a header, silently dropping unparsable name/value pairs
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the request mode
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the cache directive
    pub fn with_cache_mode(mut self, cache_mode: RequestCacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn cache_mode(&self) -> RequestCacheMode {
        self.cache_mode
    }

    /// Raw value of the `Range` header, if present and valid UTF-8
    pub fn range_header(&self) -> Option<&str> {
        self.headers.get(RANGE).and_then(|v| v.to_str().ok())
    }

    /// The request URL with query and fragment stripped
    pub fn stripped_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// A response body with its status line and headers, as held by the cache
#[derive(Debug, Clone)]
pub struct StoredResponse {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    body: Bytes,
}

impl StoredResponse {
    /// Create a response with the canonical status text for `status`
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Create a plain 200 OK response
    pub fn ok_with_body(body: Bytes) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Attach a header, silently dropping unparsable name/value pairs
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body. Cloning a `StoredResponse` duplicates this without
    /// copying: `Bytes` is reference counted, so handing one duplicate to the
    /// cache can never consume the body meant for the caller.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body length in bytes
    pub fn len(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
