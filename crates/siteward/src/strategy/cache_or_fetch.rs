//! # Generic Cache-or-Fetch
//!
//! The fallback strategy for requests no specialized route claims: answer
//! from any cache generation if possible, otherwise take a single trip to
//! the network and remember the result in the runtime generation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::PolicyError;
use crate::fetch::NetworkFetch;
use crate::http::{InterceptedRequest, StoredResponse};
use crate::precache::PrecacheLoader;
use crate::store::CacheStore;
use crate::strategy::Strategy;

pub struct CacheOrFetch {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetch>,
    precache: Arc<PrecacheLoader>,
    precache_generation: String,
    runtime_generation: String,
}

impl CacheOrFetch {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn NetworkFetch>,
        precache: Arc<PrecacheLoader>,
        precache_generation: impl Into<String>,
        runtime_generation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            precache,
            precache_generation: precache_generation.into(),
            runtime_generation: runtime_generation.into(),
        }
    }
}

#[async_trait]
impl Strategy for CacheOrFetch {
    fn name(&self) -> &'static str {
        "cache-or-fetch"
    }

    async fn handle(&self, request: &InterceptedRequest) -> Result<StoredResponse, PolicyError> {
        // Precache entries live under revisioned keys; resolve through the
        // manifest index before the plain-URL lookup.
        if let Some(key) = self.precache.cache_key_for(request.url()) {
            if let Some(hit) = self.store.get(&self.precache_generation, key).await? {
                debug!(url = %request.url(), "serving from precache");
                return Ok(hit);
            }
        }

        if let Some(hit) = self.store.match_any(request.url().as_str()).await? {
            debug!(url = %request.url(), "serving from cache");
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                // The duplicate goes to the cache; the original is returned
                // untouched to the caller.
                let duplicate = response.clone();
                if let Err(e) = self
                    .store
                    .put(&self.runtime_generation, request.url().as_str(), duplicate)
                    .await
                {
                    warn!(url = %request.url(), error = %e, "runtime cache write failed");
                }
                debug!(url = %request.url(), status = %response.status(), "cached network response");
                Ok(response)
            }
            Err(e) => {
                // An HTTP error response (e.g. 404) is a normal response and
                // never lands here; only transport failures do.
                error!(url = %request.url(), error = %e, "fetching failed");
                Err(e.into())
            }
        }
    }
}
