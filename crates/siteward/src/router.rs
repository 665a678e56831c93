//! # Request Router
//!
//! Classifies every intercepted request and dispatches it to a strategy.
//! Guards come first (pass-throughs, not errors), then the range branch,
//! then an ordered route table evaluated first-match-wins. Ordering is
//! explicit data because it encodes precedence over the generic fallback.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use tracing::debug;

use crate::error::PolicyError;
use crate::http::{InterceptedRequest, RequestCacheMode, RequestMode, StoredResponse};
use crate::precache::PrecacheLoader;
use crate::range::RangeResponder;
use crate::strategy::Strategy;

// Common image extensions, anywhere before the end of the path.
static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i).+\.(?:png|gif|jpg|jpeg|ico|svg)").expect("static image pattern"));

/// Predicate deciding whether a route claims a request
pub enum RoutePredicate {
    /// URL is listed in the precache manifest. Registered ahead of the
    /// pattern routes so a precached script is never shadowed by the
    /// runtime scripts route.
    Precached(Arc<PrecacheLoader>),
    /// Regex over the URL path (query and fragment excluded)
    PathPattern(Regex),
    /// Exact suffix match over the full URL string
    UrlSuffix(Vec<&'static str>),
}

impl RoutePredicate {
    /// The default image-route predicate
    pub fn images() -> Self {
        RoutePredicate::PathPattern(IMAGE_PATTERN.clone())
    }

    /// The default scripts-and-styles predicate
    pub fn scripts_and_styles() -> Self {
        RoutePredicate::UrlSuffix(vec![".js", ".css"])
    }

    fn matches(&self, request: &InterceptedRequest) -> bool {
        match self {
            RoutePredicate::Precached(loader) => loader.cache_key_for(request.url()).is_some(),
            RoutePredicate::PathPattern(pattern) => pattern.is_match(request.url().path()),
            RoutePredicate::UrlSuffix(suffixes) => {
                let url = request.url().as_str();
                suffixes.iter().any(|suffix| url.ends_with(suffix))
            }
        }
    }
}

/// One routing rule: a predicate bound to a strategy
pub struct Route {
    predicate: RoutePredicate,
    strategy: Arc<dyn Strategy>,
}

impl Route {
    pub fn new(predicate: RoutePredicate, strategy: Arc<dyn Strategy>) -> Self {
        Self { predicate, strategy }
    }
}

/// Router over guards, the range branch, and the ordered route table
pub struct Router {
    routes: Vec<Route>,
    fallback: Arc<dyn Strategy>,
    range: RangeResponder,
}

impl Router {
    pub fn new(routes: Vec<Route>, fallback: Arc<dyn Strategy>, range: RangeResponder) -> Self {
        Self {
            routes,
            fallback,
            range,
        }
    }

    /// Resolve a fetch event. `Ok(None)` means the request is deliberately
    /// not intercepted and should go to the network untouched.
    pub async fn dispatch(
        &self,
        request: &InterceptedRequest,
    ) -> Result<Option<StoredResponse>, PolicyError> {
        // Rewriting an only-if-cached request outside same-origin mode is
        // rejected by the host fetch machinery, so it is never intercepted.
        if request.cache_mode() == RequestCacheMode::OnlyIfCached
            && request.mode() != RequestMode::SameOrigin
        {
            debug!(url = %request.url(), mode = %request.mode(), "declined: only-if-cached outside same-origin");
            return Ok(None);
        }

        if request.method() != &Method::GET {
            debug!(method = %request.method(), url = %request.url(), "declined: non-GET request");
            return Ok(None);
        }

        if request.range_header().is_some() {
            debug!(url = %request.url(), "routing to range responder");
            return self.range.respond(request).await.map(Some);
        }

        for route in &self.routes {
            if route.predicate.matches(request) {
                debug!(url = %request.url(), strategy = route.strategy.name(), "route matched");
                return route.strategy.handle(request).await.map(Some);
            }
        }

        debug!(url = %request.url(), strategy = self.fallback.name(), "no route matched, using fallback");
        self.fallback.handle(request).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    use crate::fetch::testing::StaticFetch;
    use crate::precache::PrecacheLoader;
    use crate::store::MemoryStore;

    /// Strategy double that records how often it ran
    struct Recording {
        label: &'static str,
        hits: AtomicUsize,
    }

    impl Recording {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                hits: AtomicUsize::new(0),
            })
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Strategy for Recording {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn handle(&self, _request: &InterceptedRequest) -> Result<StoredResponse, PolicyError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(StoredResponse::ok_with_body(Bytes::from(self.label)))
        }
    }

    fn router(
        images: Arc<Recording>,
        statics: Arc<Recording>,
        fallback: Arc<Recording>,
    ) -> Router {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(StaticFetch::new());
        let scope = Url::parse("https://example.com/").unwrap();
        let precache = Arc::new(PrecacheLoader::new(Vec::new(), &scope).unwrap());
        let range = RangeResponder::new(store, fetcher, precache, "siteward-precache-v1");

        Router::new(
            vec![
                Route::new(RoutePredicate::images(), images),
                Route::new(RoutePredicate::scripts_and_styles(), statics),
            ],
            fallback,
            range,
        )
    }

    fn get(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_non_get_is_never_intercepted() {
        let (images, statics, fallback) =
            (Recording::new("img"), Recording::new("static"), Recording::new("generic"));
        let router = router(Arc::clone(&images), Arc::clone(&statics), Arc::clone(&fallback));

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let request = InterceptedRequest::new(
                method,
                Url::parse("https://example.com/form.css").unwrap(),
            );
            assert!(router.dispatch(&request).await.unwrap().is_none());
        }
        assert_eq!(images.hits() + statics.hits() + fallback.hits(), 0);
    }

    #[tokio::test]
    async fn test_only_if_cached_cross_mode_is_never_intercepted() {
        let (images, statics, fallback) =
            (Recording::new("img"), Recording::new("static"), Recording::new("generic"));
        let router = router(Arc::clone(&images), Arc::clone(&statics), Arc::clone(&fallback));

        let declined = get("https://example.com/a.png")
            .with_cache_mode(RequestCacheMode::OnlyIfCached)
            .with_mode(RequestMode::Cors);
        assert!(router.dispatch(&declined).await.unwrap().is_none());
        assert_eq!(images.hits(), 0);

        // Same directive in same-origin mode is interceptable.
        let allowed = get("https://example.com/a.png")
            .with_cache_mode(RequestCacheMode::OnlyIfCached)
            .with_mode(RequestMode::SameOrigin);
        assert!(router.dispatch(&allowed).await.unwrap().is_some());
        assert_eq!(images.hits(), 1);
    }

    #[tokio::test]
    async fn test_route_table_precedence() {
        let (images, statics, fallback) =
            (Recording::new("img"), Recording::new("static"), Recording::new("generic"));
        let router = router(Arc::clone(&images), Arc::clone(&statics), Arc::clone(&fallback));

        router.dispatch(&get("https://example.com/pics/photo.JPG")).await.unwrap();
        assert_eq!(images.hits(), 1);

        router.dispatch(&get("https://example.com/bundle.js")).await.unwrap();
        router.dispatch(&get("https://example.com/site.css")).await.unwrap();
        assert_eq!(statics.hits(), 2);

        router.dispatch(&get("https://example.com/index.html")).await.unwrap();
        assert_eq!(fallback.hits(), 1);
    }

    #[tokio::test]
    async fn test_image_pattern_ignores_query() {
        let (images, statics, fallback) =
            (Recording::new("img"), Recording::new("static"), Recording::new("generic"));
        let router = router(Arc::clone(&images), Arc::clone(&statics), Arc::clone(&fallback));

        router
            .dispatch(&get("https://example.com/logo.svg?width=64"))
            .await
            .unwrap();
        assert_eq!(images.hits(), 1);

        // A query-suffixed script is not an exact .js suffix, so it falls
        // through to the generic strategy.
        router
            .dispatch(&get("https://example.com/bundle.js?v=2"))
            .await
            .unwrap();
        assert_eq!(statics.hits(), 0);
        assert_eq!(fallback.hits(), 1);
    }

    #[tokio::test]
    async fn test_precache_route_beats_pattern_routes() {
        let precached = Recording::new("precache");
        let statics = Recording::new("static");
        let fallback = Recording::new("generic");

        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(StaticFetch::new());
        let scope = Url::parse("https://example.com/").unwrap();
        let loader = Arc::new(
            PrecacheLoader::new(
                vec![crate::precache::ManifestEntry {
                    url: "app.js".to_string(),
                    revision: "ca8d3419954c12129d126ae400f23115".to_string(),
                }],
                &scope,
            )
            .unwrap(),
        );
        let range = RangeResponder::new(store, fetcher, Arc::clone(&loader), "siteward-precache-v1");
        let router = Router::new(
            vec![
                Route::new(RoutePredicate::Precached(loader), Arc::clone(&precached) as _),
                Route::new(RoutePredicate::scripts_and_styles(), Arc::clone(&statics) as _),
            ],
            fallback,
            range,
        );

        router.dispatch(&get("https://example.com/app.js")).await.unwrap();
        assert_eq!(precached.hits(), 1);
        assert_eq!(statics.hits(), 0);

        router.dispatch(&get("https://example.com/vendor.js")).await.unwrap();
        assert_eq!(statics.hits(), 1);
    }

    #[tokio::test]
    async fn test_range_header_takes_the_range_branch() {
        let (images, statics, fallback) =
            (Recording::new("img"), Recording::new("static"), Recording::new("generic"));
        let router = router(Arc::clone(&images), Arc::clone(&statics), Arc::clone(&fallback));

        // Unknown resource and empty fetcher: the range branch propagates
        // the miss as a fetch failure, proving none of the strategies ran.
        let err = router
            .dispatch(&get("https://example.com/video.webm").with_header("Range", "bytes=0-"))
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Fetch(_)));
        assert_eq!(images.hits() + statics.hits() + fallback.hits(), 0);
    }
}
