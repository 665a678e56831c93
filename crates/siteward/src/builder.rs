//! # Builder for EngineConfig
//!
//! This module provides a builder pattern implementation for creating and
//! customizing EngineConfig instances with a fluent API.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use siteward_engine::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .with_cache_prefix("purple_mystic")
//!     .with_version("v2")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("MyApp/1.0")
//!     .build();
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::config::EngineConfig;
use crate::expiration::ExpirationPolicy;

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    /// Internal config being built
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the cache generation name prefix
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cache_prefix = prefix.into();
        self
    }

    /// Set the cache generation version suffix
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Set the scope relative manifest URLs resolve against
    pub fn with_scope(mut self, scope: Url) -> Self {
        self.config.scope = scope;
        self
    }

    /// Set the expiration policy of the images generation
    pub fn with_image_expiration(mut self, policy: ExpirationPolicy) -> Self {
        self.config.image_expiration = policy;
        self
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.fetch.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetch.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.fetch.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.fetch.headers = headers;
        self
    }

    /// Build the EngineConfig instance
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = EngineConfigBuilder::new().build();
        assert_eq!(config.cache_prefix, "siteward");
        assert_eq!(config.version, "v1");
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
        assert!(config.fetch.follow_redirects);
        assert_eq!(config.image_expiration.max_entries, Some(50));
    }

    #[test]
    fn test_builder_customization() {
        let config = EngineConfigBuilder::new()
            .with_cache_prefix("purple_mystic")
            .with_version("v3")
            .with_timeout(Duration::from_secs(60))
            .with_follow_redirects(false)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .build();

        assert_eq!(config.precache_name(), "purple_mystic-precache-v3");
        assert_eq!(config.fetch.timeout, Duration::from_secs(60));
        assert!(!config.fetch.follow_redirects);
        assert_eq!(config.fetch.user_agent, "CustomUserAgent/1.0");

        let header_value = config.fetch.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
    }
}
