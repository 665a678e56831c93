//! # Siteward
//!
//! A request-interception and cache-policy engine for static sites:
//! answers fetch events from a precache populated at install time, falls
//! back to single-attempt network fetches, and synthesizes partial-content
//! responses from fully cached bodies.
//!
//! ## Features
//!
//! - Install/activate lifecycle with stale-generation purging
//! - Manifest-driven precache with revision-keyed storage
//! - Ordered, first-match-wins routing over guards and URL patterns
//! - Cache-first images with entry/age bounds and quota recovery
//! - Stale-while-revalidate scripts and styles
//! - HTTP 206 synthesis for open-ended byte-range requests

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod expiration;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod precache;
pub mod range;
pub mod router;
pub mod store;
pub mod strategy;

pub use builder::EngineConfigBuilder;
pub use config::{CachePurpose, EngineConfig, FetchConfig};
pub use engine::InterceptEngine;
pub use error::PolicyError;
pub use events::{EventOutcome, WorkerEvent, WorkerMessage};
pub use expiration::ExpirationPolicy;
pub use fetch::{FetchError, HttpFetcher, NetworkFetch, create_client};
pub use http::{InterceptedRequest, RequestCacheMode, RequestMode, StoredResponse};
pub use lifecycle::{Lifecycle, WorkerPhase};
pub use precache::{ManifestEntry, PrecacheLoader};
pub use range::RangeResponder;
pub use router::{Route, RoutePredicate, Router};
pub use store::{CacheStore, EntryStamp, MemoryStore, StoreError, StoreResult};
pub use strategy::{CacheFirst, CacheOrFetch, StaleWhileRevalidate, Strategy};
