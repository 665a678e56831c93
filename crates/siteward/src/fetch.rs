//! # Network Fetcher
//!
//! The engine's single seam to the network. Strategies issue exactly one
//! fetch attempt per decision; there is no retry or backoff here.

use async_trait::async_trait;
use reqwest::Client;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::http::{InterceptedRequest, StoredResponse};

/// Errors produced while fetching from the network
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fetch failed: {0}")]
    Other(String),
}

/// Single-attempt network retrieval
#[async_trait]
pub trait NetworkFetch: Send + Sync {
    /// Fetch the request from the network and buffer the full body.
    ///
    /// An HTTP error status is a normal response; only transport-level
    /// failures produce an `Err`.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<StoredResponse, FetchError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &FetchConfig) -> Result<Client, FetchError> {
    // Create the crypto provider
    let provider = Arc::new(ring::default_provider());

    // Build platform default TLS configuration
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .map_err(|e| FetchError::Other(format!("TLS verifier unavailable: {e}")))?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5) // Allow multiple connections to same host
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls_config)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(FetchError::from)
}

/// Network fetcher backed by a reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher from the engine's fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NetworkFetch for HttpFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<StoredResponse, FetchError> {
        let response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut stored = StoredResponse::new(status, body);
        for (name, value) in headers.iter() {
            if let Ok(value) = value.to_str() {
                stored = stored.with_header(name.as_str(), value);
            }
        }
        Ok(stored)
    }
}
