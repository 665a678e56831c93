//! # Interception Engine
//!
//! Composition root: wires the store, fetcher, precache loader, router, and
//! lifecycle together and exposes the single [`InterceptEngine::dispatch`]
//! entry point the hosting environment drives.

use std::sync::Arc;

use tracing::debug;

use crate::config::{CachePurpose, EngineConfig};
use crate::error::PolicyError;
use crate::events::{EventOutcome, WorkerEvent, WorkerMessage};
use crate::fetch::NetworkFetch;
use crate::lifecycle::Lifecycle;
use crate::precache::{ManifestEntry, PrecacheLoader};
use crate::range::RangeResponder;
use crate::router::{Route, RoutePredicate, Router};
use crate::store::CacheStore;
use crate::strategy::{CacheFirst, CacheOrFetch, StaleWhileRevalidate, Strategy};

/// The interception and cache policy engine
pub struct InterceptEngine {
    config: EngineConfig,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetch>,
    precache: Arc<PrecacheLoader>,
    router: Router,
    lifecycle: Lifecycle,
}

impl InterceptEngine {
    /// Build an engine over an injected store and fetcher, with the default
    /// route table: manifest URLs → precache lookup, images → cache-first,
    /// scripts/styles → stale-while-revalidate, everything else →
    /// cache-or-fetch.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn NetworkFetch>,
        manifest: Vec<ManifestEntry>,
    ) -> Result<Self, PolicyError> {
        let precache = Arc::new(PrecacheLoader::new(manifest, &config.scope)?);
        let precache_name = config.precache_name();

        let images = Arc::new(CacheFirst::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            config.cache_name(CachePurpose::Images),
            config.image_expiration.clone(),
        ));
        let statics = Arc::new(StaleWhileRevalidate::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            config.cache_name(CachePurpose::Static),
        ));
        let fallback = Arc::new(CacheOrFetch::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            Arc::clone(&precache),
            precache_name.clone(),
            config.cache_name(CachePurpose::Runtime),
        ));
        let range = RangeResponder::new(
            Arc::clone(&store),
            Arc::clone(&fetcher),
            Arc::clone(&precache),
            precache_name,
        );

        let router = Router::new(
            vec![
                // Manifest URLs resolve through the precache before any
                // pattern route can claim them.
                Route::new(
                    RoutePredicate::Precached(Arc::clone(&precache)),
                    Arc::clone(&fallback) as Arc<dyn Strategy>,
                ),
                Route::new(RoutePredicate::images(), images),
                Route::new(RoutePredicate::scripts_and_styles(), statics),
            ],
            fallback,
            range,
        );

        Ok(Self {
            config,
            store,
            fetcher,
            precache,
            router,
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Handle one host event. Failures affect only the event that raised
    /// them; the engine itself stays serviceable.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, PolicyError> {
        match event {
            WorkerEvent::Install => {
                let precached = self
                    .lifecycle
                    .install(
                        &self.precache,
                        self.store.as_ref(),
                        self.fetcher.as_ref(),
                        &self.config.precache_name(),
                    )
                    .await?;
                Ok(EventOutcome::Installed { precached })
            }
            WorkerEvent::Activate => {
                let purged_generations = self
                    .lifecycle
                    .activate(
                        &self.precache,
                        self.store.as_ref(),
                        &self.config.precache_name(),
                    )
                    .await?;
                Ok(EventOutcome::Activated { purged_generations })
            }
            WorkerEvent::Message(WorkerMessage::SkipWaiting) => {
                self.lifecycle.request_skip_waiting();
                Ok(EventOutcome::Acknowledged)
            }
            WorkerEvent::Fetch(request) => {
                if !self.lifecycle.phase().can_intercept() {
                    debug!(url = %request.url(), phase = %self.lifecycle.phase(), "not controlling yet, passing through");
                    return Ok(EventOutcome::Passthrough);
                }
                match self.router.dispatch(&request).await? {
                    Some(response) => Ok(EventOutcome::Respond(response)),
                    None => Ok(EventOutcome::Passthrough),
                }
            }
        }
    }
}
