//! # Worker Lifecycle
//!
//! Tracks the worker's phase and runs the install/activate transitions:
//! install populates the precache and requests immediate takeover, activate
//! purges every stale cache generation before claiming open pages.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::PolicyError;
use crate::fetch::NetworkFetch;
use crate::precache::PrecacheLoader;
use crate::store::CacheStore;

/// Worker lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Registered, nothing run yet
    Parsed,
    /// Install event in progress
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activate event in progress
    Activating,
    /// Active and controlling pages
    Activated,
}

impl WorkerPhase {
    /// Fetch interception only happens once the worker controls its pages
    pub fn can_intercept(&self) -> bool {
        matches!(self, WorkerPhase::Activated)
    }
}

impl std::fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerPhase::Parsed => write!(f, "parsed"),
            WorkerPhase::Installing => write!(f, "installing"),
            WorkerPhase::Installed => write!(f, "installed"),
            WorkerPhase::Activating => write!(f, "activating"),
            WorkerPhase::Activated => write!(f, "activated"),
        }
    }
}

/// Lifecycle state machine and transition runner
pub struct Lifecycle {
    phase: RwLock<WorkerPhase>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(WorkerPhase::Parsed),
            skip_waiting: AtomicBool::new(false),
            controlling: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase.read()
    }

    /// Whether this worker version has claimed its pages
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Whether immediate activation was requested
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Request immediate activation (SKIP_WAITING message or install hook)
    pub fn request_skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::SeqCst) {
            info!("immediate activation requested");
        }
    }

    fn set_phase(&self, next: WorkerPhase) {
        let mut phase = self.phase.write();
        debug!(from = %*phase, to = %next, "lifecycle transition");
        *phase = next;
    }

    /// Install: populate the precache, then request immediate takeover.
    /// Safe to run repeatedly; precache writes overwrite and up-to-date
    /// revisions are skipped.
    pub async fn install(
        &self,
        loader: &PrecacheLoader,
        store: &dyn CacheStore,
        fetcher: &dyn NetworkFetch,
        precache_generation: &str,
    ) -> Result<usize, PolicyError> {
        self.set_phase(WorkerPhase::Installing);
        let fetched = loader.install(store, fetcher, precache_generation).await?;
        self.set_phase(WorkerPhase::Installed);
        self.request_skip_waiting();
        info!(precached = fetched, "worker installed");
        Ok(fetched)
    }

    /// Activate: delete every generation other than the current precache
    /// generation, drop outdated precache revisions, then claim open pages.
    /// All deletions are awaited before the claim so no page can observe a
    /// controlling worker over a generation still being torn down.
    pub async fn activate(
        &self,
        loader: &PrecacheLoader,
        store: &dyn CacheStore,
        precache_generation: &str,
    ) -> Result<usize, PolicyError> {
        self.set_phase(WorkerPhase::Activating);

        let mut purged = 0;
        for name in store.generations().await? {
            if name != precache_generation {
                store.delete_generation(&name).await?;
                info!(generation = %name, "purged stale cache generation");
                purged += 1;
            }
        }
        loader.cleanup_outdated(store, precache_generation).await?;

        self.controlling.store(true, Ordering::SeqCst);
        self.set_phase(WorkerPhase::Activated);
        info!(purged, "worker activated and claimed clients");
        Ok(purged)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
