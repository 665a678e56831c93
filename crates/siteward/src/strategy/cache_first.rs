//! # Cache-First
//!
//! Strategy for the bounded images generation: a cached copy always wins,
//! the network only fills gaps, and every write is followed by an
//! expiration sweep so the generation stays within its entry and age caps.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::expiration::ExpirationPolicy;
use crate::fetch::NetworkFetch;
use crate::http::{InterceptedRequest, StoredResponse};
use crate::store::{CacheStore, StoreError};
use crate::strategy::Strategy;

pub struct CacheFirst {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetch>,
    generation: String,
    expiration: ExpirationPolicy,
}

impl CacheFirst {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn NetworkFetch>,
        generation: impl Into<String>,
        expiration: ExpirationPolicy,
    ) -> Self {
        Self {
            store,
            fetcher,
            generation: generation.into(),
            expiration,
        }
    }

    async fn remember(&self, key: &str, response: StoredResponse) -> Result<(), PolicyError> {
        match self.store.put(&self.generation, key, response.clone()).await {
            Ok(()) => {}
            Err(StoreError::QuotaExceeded { .. }) if self.expiration.purge_on_quota => {
                self.expiration.purge(self.store.as_ref(), &self.generation).await?;
                // Best effort: the write is re-attempted once after the
                // purge, but its failure never fails the response.
                if let Err(e) = self.store.put(&self.generation, key, response).await {
                    warn!(key, error = %e, "image cache write failed after quota purge");
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.expiration.sweep(self.store.as_ref(), &self.generation).await?;
        Ok(())
    }
}

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache-first"
    }

    async fn handle(&self, request: &InterceptedRequest) -> Result<StoredResponse, PolicyError> {
        let key = request.url().as_str();

        if let Some(hit) = self.store.get(&self.generation, key).await? {
            debug!(url = %request.url(), "image served from cache");
            return Ok(hit);
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_success() {
            self.remember(key, response.clone()).await?;
        } else {
            debug!(url = %request.url(), status = %response.status(), "not caching error response");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetch;
    use crate::store::MemoryStore;
    use url::Url;

    const GENERATION: &str = "siteward-images-v1";

    #[inline]
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer() // Write to test output
            .try_init();
    }

    fn strategy(
        fetcher: StaticFetch,
        expiration: ExpirationPolicy,
        store: Arc<MemoryStore>,
    ) -> (CacheFirst, Arc<StaticFetch>) {
        let fetcher = Arc::new(fetcher);
        let strategy = CacheFirst::new(
            Arc::clone(&store) as Arc<dyn CacheStore>,
            Arc::clone(&fetcher) as Arc<dyn NetworkFetch>,
            GENERATION,
            expiration,
        );
        (strategy, fetcher)
    }

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetch::new().with_resource("https://example.com/logo.png", "png");
        let (strategy, fetcher) = strategy(fetcher, ExpirationPolicy::images_default(), store);

        let request = get("https://example.com/logo.png");
        strategy.handle(&request).await.unwrap();
        strategy.handle(&request).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_entry_cap_evicts_oldest_image() {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetch::new();
        for i in 0..51 {
            fetcher.insert(
                &format!("https://example.com/img-{i:02}.png"),
                StoredResponse::ok_with_body("img".into()),
            );
        }
        let (strategy, _) = strategy(fetcher, ExpirationPolicy::images_default(), Arc::clone(&store));

        for i in 0..51 {
            strategy
                .handle(&get(&format!("https://example.com/img-{i:02}.png")))
                .await
                .unwrap();
        }

        let entries = store.entries(GENERATION).await.unwrap();
        assert_eq!(entries.len(), 50);
        // The first-inserted image is the one that went.
        assert!(!entries.iter().any(|e| e.key == "https://example.com/img-00.png"));
        assert!(entries.iter().any(|e| e.key == "https://example.com/img-50.png"));
    }

    #[tokio::test]
    async fn test_quota_purge_recovers_and_reattempts() {
        // Quota holds one small body at a time; the second distinct image
        // trips it, purges, and the re-put succeeds.
        let store = Arc::new(MemoryStore::with_quota(4));
        let fetcher = StaticFetch::new()
            .with_resource("https://example.com/a.png", "aaa")
            .with_resource("https://example.com/b.png", "bbb");
        let (strategy, _) = strategy(fetcher, ExpirationPolicy::images_default(), Arc::clone(&store));

        strategy.handle(&get("https://example.com/a.png")).await.unwrap();
        let response = strategy.handle(&get("https://example.com/b.png")).await.unwrap();
        assert_eq!(response.body(), "bbb");

        let entries = store.entries(GENERATION).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "https://example.com/b.png");
    }

    #[tokio::test]
    async fn test_error_responses_are_returned_but_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetch::new()
            .with_response("https://example.com/gone.png", crate::fetch::testing::not_found());
        let (strategy, fetcher) = strategy(fetcher, ExpirationPolicy::images_default(), Arc::clone(&store));

        let response = strategy.handle(&get("https://example.com/gone.png")).await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
        assert!(store.entries(GENERATION).await.unwrap().is_empty());
        // A retry still goes to the network.
        strategy.handle(&get("https://example.com/gone.png")).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }
}
