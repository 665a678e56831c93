use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::expiration::ExpirationPolicy;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Purpose tag of a cache generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePurpose {
    /// Build-time-known resources, populated at install
    Precache,
    /// Generic responses captured from observed traffic
    Runtime,
    /// Bounded image cache
    Images,
    /// Scripts and styles kept fresh via revalidation
    Static,
}

impl std::fmt::Display for CachePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachePurpose::Precache => write!(f, "precache"),
            CachePurpose::Runtime => write!(f, "runtime"),
            CachePurpose::Images => write!(f, "images"),
            CachePurpose::Static => write!(f, "static"),
        }
    }
}

/// Configurable options for the interception engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deployment-fixed prefix for cache generation names
    pub cache_prefix: String,

    /// Version suffix for cache generation names; bumping it strands every
    /// previous generation for removal on the next activation
    pub version: String,

    /// Scope the worker controls; relative manifest URLs resolve against it
    pub scope: Url,

    /// Expiration bounds applied to the images generation
    pub image_expiration: ExpirationPolicy,

    /// Network fetch settings
    pub fetch: FetchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "siteward".to_string(),
            version: "v1".to_string(),
            scope: Url::parse("http://localhost/").expect("static scope URL"),
            image_expiration: ExpirationPolicy::images_default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> crate::builder::EngineConfigBuilder {
        crate::builder::EngineConfigBuilder::new()
    }

    /// Generation name for the given purpose: `<prefix>-<purpose>-<version>`
    pub fn cache_name(&self, purpose: CachePurpose) -> String {
        format!("{}-{}-{}", self.cache_prefix, purpose, self.version)
    }

    /// Name of the current precache generation
    pub fn precache_name(&self) -> String {
        self.cache_name(CachePurpose::Precache)
    }
}

/// Configurable options for the network side
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetchConfig::get_default_headers(),
        }
    }
}

impl FetchConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_naming_scheme() {
        let config = EngineConfig {
            cache_prefix: "purple_mystic".to_string(),
            version: "v1".to_string(),
            ..Default::default()
        };

        assert_eq!(config.precache_name(), "purple_mystic-precache-v1");
        assert_eq!(config.cache_name(CachePurpose::Runtime), "purple_mystic-runtime-v1");
        assert_eq!(config.cache_name(CachePurpose::Images), "purple_mystic-images-v1");
        assert_eq!(config.cache_name(CachePurpose::Static), "purple_mystic-static-v1");
    }

    #[test]
    fn test_fetch_defaults() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.timeout, Duration::from_secs(30));
        assert!(fetch.follow_redirects);
        assert!(fetch.headers.contains_key(reqwest::header::ACCEPT));
    }
}
