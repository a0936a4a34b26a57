//! Per-process catalog context.
//!
//! Bundles the [`CacheStore`] and [`UpdateScheduler`] into one explicit
//! context object constructed once per process and passed by reference to
//! every consumer. There are no module-level singletons; single-instance
//! semantics come from constructing this once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::provider::CatalogProvider;
use crate::updater::UpdateScheduler;

/// Shared services for one catalog process.
pub struct CatalogContext {
    /// The TTL cache. Consumers read cache hits from here directly.
    pub cache: Arc<CacheStore>,
    /// The background updater. Consumers register per-key refreshes here.
    pub updater: UpdateScheduler,
    shut_down: AtomicBool,
}

impl CatalogContext {
    /// Build a context from configuration and a catalog provider.
    pub fn new(config: &Config, provider: Arc<dyn CatalogProvider>) -> Self {
        let cache = Arc::new(CacheStore::new(config.cache.ttls()));
        let updater =
            UpdateScheduler::new(Arc::clone(&cache), provider, config.updater.settings());

        Self {
            cache,
            updater,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Stop all background refresh tasks. Runs at most once; later calls
    /// (including the one from `Drop`) are no-ops.
    ///
    /// Wire this to the process teardown path so no orphaned task keeps
    /// polling providers after the consuming context is gone.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down catalog context");
        self.updater.stop_all();
    }
}

impl Drop for CatalogContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
