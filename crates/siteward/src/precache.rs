//! # Precache Loader
//!
//! Populates the precache generation from a build-time manifest of
//! `{url, revision}` pairs. The storage key is derived from url+revision, so
//! a revision bump can never be shadowed by bytes cached under the previous
//! revision; superseded keys are swept out during activation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::PolicyError;
use crate::fetch::NetworkFetch;
use crate::http::InterceptedRequest;
use crate::store::CacheStore;

/// One build-time manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Resource URL, absolute or relative to the worker scope
    pub url: String,
    /// Content fingerprint; changes whenever the resource's bytes change
    pub revision: String,
}

/// Loader for the install-time precache
pub struct PrecacheLoader {
    // (absolute URL to fetch, revisioned storage key), manifest order
    targets: Vec<(Url, String)>,
    // stripped absolute URL -> revisioned storage key
    index: HashMap<String, String>,
}

impl PrecacheLoader {
    /// Build a loader, resolving relative manifest URLs against `scope`
    pub fn new(manifest: Vec<ManifestEntry>, scope: &Url) -> Result<Self, PolicyError> {
        let mut targets = Vec::with_capacity(manifest.len());
        let mut index = HashMap::with_capacity(manifest.len());

        for entry in &manifest {
            let absolute = scope.join(&entry.url)?;
            let key = revisioned_key(&absolute, &entry.revision);
            index.insert(stripped(&absolute), key.clone());
            targets.push((absolute, key));
        }

        Ok(Self { targets, index })
    }

    /// Build a loader from the manifest's JSON form
    pub fn from_json(json: &str, scope: &Url) -> Result<Self, PolicyError> {
        let manifest: Vec<ManifestEntry> = serde_json::from_str(json)?;
        Self::new(manifest, scope)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Current storage key for a plain request URL (query and fragment
    /// ignored), if the URL is in the manifest
    pub fn cache_key_for(&self, url: &Url) -> Option<&str> {
        self.index.get(&stripped(url)).map(String::as_str)
    }

    /// Ensure every manifest URL is satisfiable from `generation`.
    ///
    /// Entries whose current revisioned key is already present are skipped,
    /// which makes repeated installs idempotent. Returns how many resources
    /// were fetched.
    pub async fn install(
        &self,
        store: &dyn CacheStore,
        fetcher: &dyn NetworkFetch,
        generation: &str,
    ) -> Result<usize, PolicyError> {
        let mut fetched = 0;

        for (url, key) in &self.targets {
            if store.get(generation, key).await?.is_some() {
                debug!(url = %url, "precache entry up to date");
                continue;
            }

            let response = fetcher
                .fetch(&InterceptedRequest::get(url.clone()))
                .await?;
            if !response.is_success() {
                return Err(PolicyError::Precache {
                    url: url.to_string(),
                    status: response.status(),
                });
            }

            store.put(generation, key, response).await?;
            debug!(url = %url, key, "precached resource");
            fetched += 1;
        }

        info!(
            generation,
            total = self.targets.len(),
            fetched,
            "precache populated"
        );
        Ok(fetched)
    }

    /// Drop keys in `generation` that no current manifest entry maps to,
    /// i.e. leftovers from previous revisions. Returns how many were removed.
    pub async fn cleanup_outdated(
        &self,
        store: &dyn CacheStore,
        generation: &str,
    ) -> Result<usize, PolicyError> {
        let mut removed = 0;
        for stamp in store.entries(generation).await? {
            if !self.index.values().any(|key| key == &stamp.key) {
                store.delete(generation, &stamp.key).await?;
                debug!(generation, key = %stamp.key, "dropped outdated precache revision");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn stripped(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

fn revisioned_key(url: &Url, revision: &str) -> String {
    format!("{}#rev={}", stripped(url), revision)
}
