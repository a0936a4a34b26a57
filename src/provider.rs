//! Trait definition for catalog data providers.
//!
//! This module defines the [`CatalogProvider`] trait that data backends
//! (GraphQL catalog, episode lookup services, mirror chains) must implement.
//! The scheduler only requires that each call returns a value or fails; how
//! a provider resolves the data is its own concern.

use async_trait::async_trait;

use crate::types::{Episode, MediaItem};

/// Async trait that all catalog providers must implement.
///
/// Each provider wraps one or more external APIs and exposes a uniform
/// interface for the three resource classes the updater polls. Every method
/// is called repeatedly on a fixed interval, so implementations must fail
/// cleanly (return an error or an empty result) rather than panic.
///
/// Providers are expected to be wrapped in an `Arc` so they can be shared
/// across refresh tasks.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the current trending series, paginated.
    async fn fetch_trending(&self, page: u32, per_page: u32) -> anyhow::Result<Vec<MediaItem>>;

    /// Fetch full details for the series identified by `id`.
    ///
    /// Returns `Ok(None)` when the catalog has no entry for `id`.
    async fn fetch_details(&self, id: u64) -> anyhow::Result<Option<MediaItem>>;

    /// Fetch the episode list for the series identified by `id`.
    async fn fetch_episodes(&self, id: &str) -> anyhow::Result<Vec<Episode>>;
}
