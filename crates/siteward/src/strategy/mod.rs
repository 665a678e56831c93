//! # Cache Strategies
//!
//! This module contains the response strategies the router dispatches to.
//! Each strategy owns the generation it reads and writes; all of them go
//! through the injected store and fetcher seams.

// Re-export strategies for easier access
pub use self::cache_first::CacheFirst;
pub use self::cache_or_fetch::CacheOrFetch;
pub use self::stale_while_revalidate::StaleWhileRevalidate;

use async_trait::async_trait;

use crate::error::PolicyError;
use crate::http::{InterceptedRequest, StoredResponse};

/// A strategy resolves one classified GET request into a response
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name, used in routing traces
    fn name(&self) -> &'static str;

    /// Resolve the request into exactly one response
    async fn handle(&self, request: &InterceptedRequest) -> Result<StoredResponse, PolicyError>;
}

// Individual strategy implementations
pub mod cache_first;
pub mod cache_or_fetch;
pub mod stale_while_revalidate;
