//! # Range Responder
//!
//! Synthesizes `206 Partial Content` responses from a fully cached resource
//! body, for the open-ended single-range form `bytes=<N>-` used by partial
//! media delivery. Anything else (multi-range, suffix ranges, garbage) is
//! answered with `416 Range Not Satisfiable` rather than dropped.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::CONTENT_RANGE;
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::fetch::NetworkFetch;
use crate::http::{InterceptedRequest, StoredResponse};
use crate::precache::PrecacheLoader;
use crate::store::CacheStore;

static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bytes=(\d+)-$").expect("static range pattern"));

/// Parse the start offset out of an open-ended `bytes=<N>-` header value
pub fn parse_range_start(header: &str) -> Option<u64> {
    RANGE_PATTERN
        .captures(header)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Responder for requests carrying a `Range` header
pub struct RangeResponder {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetch>,
    precache: Arc<PrecacheLoader>,
    precache_generation: String,
}

impl RangeResponder {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn NetworkFetch>,
        precache: Arc<PrecacheLoader>,
        precache_generation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            precache,
            precache_generation: precache_generation.into(),
        }
    }

    /// Full (non-ranged) resource from the precache generation, if present
    async fn cached_full_body(
        &self,
        request: &InterceptedRequest,
    ) -> Result<Option<StoredResponse>, PolicyError> {
        let Some(key) = self.precache.cache_key_for(request.url()) else {
            return Ok(None);
        };
        Ok(self.store.get(&self.precache_generation, key).await?)
    }

    /// Resolve a range request into a 206 (or 416) response
    pub async fn respond(
        &self,
        request: &InterceptedRequest,
    ) -> Result<StoredResponse, PolicyError> {
        let header = request.range_header().unwrap_or_default();
        let cached = self.cached_full_body(request).await?;

        let Some(start) = parse_range_start(header) else {
            warn!(url = %request.url(), header, "unsupported range form");
            return Ok(not_satisfiable(cached.as_ref().map(StoredResponse::len)));
        };

        // The range is cut from the fully cached body; on a precache miss
        // the full body is fetched once and deliberately NOT cached, only
        // the range logic consumes it.
        let full = match cached {
            Some(response) => response,
            None => self.fetcher.fetch(request).await?,
        };

        let total = full.len();
        if start >= total {
            warn!(url = %request.url(), start, total, "range start beyond resource length");
            return Ok(not_satisfiable(Some(total)));
        }

        debug!(url = %request.url(), start, total, "synthesizing partial content");
        let body = full.body().slice(start as usize..);
        Ok(StoredResponse::new(StatusCode::PARTIAL_CONTENT, body).with_header(
            CONTENT_RANGE.as_str(),
            format!("bytes {}-{}/{}", start, total - 1, total),
        ))
    }
}

fn not_satisfiable(total: Option<u64>) -> StoredResponse {
    let response = StoredResponse::new(StatusCode::RANGE_NOT_SATISFIABLE, Default::default());
    match total {
        Some(total) => response.with_header(CONTENT_RANGE.as_str(), format!("bytes */{total}")),
        None => response,
    }
}
