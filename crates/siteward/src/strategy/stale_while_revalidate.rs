//! # Stale-While-Revalidate
//!
//! Strategy for scripts and styles: a cached copy is returned immediately
//! while a background task refreshes the entry for the next request. Only a
//! cold cache makes the caller wait for the network.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::fetch::NetworkFetch;
use crate::http::{InterceptedRequest, StoredResponse};
use crate::store::CacheStore;
use crate::strategy::Strategy;

pub struct StaleWhileRevalidate {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetch>,
    generation: String,
}

impl StaleWhileRevalidate {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn NetworkFetch>,
        generation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            generation: generation.into(),
        }
    }

    // Detached refresh task. Failures are logged and swallowed: the caller
    // already has its response.
    fn spawn_revalidation(&self, request: InterceptedRequest) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let generation = self.generation.clone();

        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    if let Err(e) = store
                        .put(&generation, request.url().as_str(), response)
                        .await
                    {
                        warn!(url = %request.url(), error = %e, "revalidation write failed");
                    } else {
                        debug!(url = %request.url(), "cache entry revalidated");
                    }
                }
                Ok(response) => {
                    debug!(url = %request.url(), status = %response.status(), "revalidation kept stale entry");
                }
                Err(e) => {
                    warn!(url = %request.url(), error = %e, "background revalidation failed");
                }
            }
        })
    }
}

#[async_trait]
impl Strategy for StaleWhileRevalidate {
    fn name(&self) -> &'static str {
        "stale-while-revalidate"
    }

    async fn handle(&self, request: &InterceptedRequest) -> Result<StoredResponse, PolicyError> {
        let key = request.url().as_str();

        if let Some(hit) = self.store.get(&self.generation, key).await? {
            debug!(url = %request.url(), "serving stale copy, revalidating in background");
            self.spawn_revalidation(request.clone());
            return Ok(hit);
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_success() {
            if let Err(e) = self
                .store
                .put(&self.generation, key, response.clone())
                .await
            {
                warn!(url = %request.url(), error = %e, "static cache write failed");
            }
        }
        Ok(response)
    }
}
