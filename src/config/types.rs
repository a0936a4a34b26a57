use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::CacheTtls;
use crate::updater::UpdaterSettings;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub updater: UpdaterConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// TTL for the trending list (default: 600 = 10 minutes)
    #[serde(default = "default_trending_ttl")]
    pub trending_ttl_secs: u64,

    /// TTL for series details (default: 1800 = 30 minutes)
    #[serde(default = "default_details_ttl")]
    pub details_ttl_secs: u64,

    /// TTL for episode lists (default: 300 = 5 minutes)
    #[serde(default = "default_default_ttl")]
    pub episodes_ttl_secs: u64,

    /// TTL for anything without a dedicated class (default: 300 = 5 minutes)
    #[serde(default = "default_default_ttl")]
    pub default_ttl_secs: u64,

    /// Staleness window governing proactive refresh (default: 120 = 2 minutes)
    #[serde(default = "default_stale_window")]
    pub stale_window_secs: u64,
}

fn default_trending_ttl() -> u64 {
    600
}
fn default_details_ttl() -> u64 {
    1800
}
fn default_default_ttl() -> u64 {
    300
}
fn default_stale_window() -> u64 {
    120
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            trending_ttl_secs: default_trending_ttl(),
            details_ttl_secs: default_details_ttl(),
            episodes_ttl_secs: default_default_ttl(),
            default_ttl_secs: default_default_ttl(),
            stale_window_secs: default_stale_window(),
        }
    }
}

impl CacheConfig {
    /// TTL table for constructing a [`crate::cache::CacheStore`].
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            trending: Duration::from_secs(self.trending_ttl_secs),
            details: Duration::from_secs(self.details_ttl_secs),
            episodes: Duration::from_secs(self.episodes_ttl_secs),
            default: Duration::from_secs(self.default_ttl_secs),
            stale_window: Duration::from_secs(self.stale_window_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdaterConfig {
    /// Seconds between trending refreshes (default: 600 = 10 minutes)
    #[serde(default = "default_trending_interval")]
    pub trending_interval_secs: u64,

    /// Seconds between details refreshes (default: 1800 = 30 minutes)
    #[serde(default = "default_details_interval")]
    pub details_interval_secs: u64,

    /// Seconds between episode-list refreshes (default: 300 = 5 minutes)
    #[serde(default = "default_episodes_interval")]
    pub episodes_interval_secs: u64,

    /// Trending page to poll (default: 1)
    #[serde(default = "default_trending_page")]
    pub trending_page: u32,

    /// Trending page size (default: 24)
    #[serde(default = "default_trending_per_page")]
    pub trending_per_page: u32,
}

fn default_trending_interval() -> u64 {
    600
}
fn default_details_interval() -> u64 {
    1800
}
fn default_episodes_interval() -> u64 {
    300
}
fn default_trending_page() -> u32 {
    1
}
fn default_trending_per_page() -> u32 {
    24
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            trending_interval_secs: default_trending_interval(),
            details_interval_secs: default_details_interval(),
            episodes_interval_secs: default_episodes_interval(),
            trending_page: default_trending_page(),
            trending_per_page: default_trending_per_page(),
        }
    }
}

impl UpdaterConfig {
    /// Settings for constructing an [`crate::updater::UpdateScheduler`].
    pub fn settings(&self) -> UpdaterSettings {
        UpdaterSettings {
            trending_interval: Duration::from_secs(self.trending_interval_secs),
            details_interval: Duration::from_secs(self.details_interval_secs),
            episodes_interval: Duration::from_secs(self.episodes_interval_secs),
            trending_page: self.trending_page,
            trending_per_page: self.trending_per_page,
        }
    }
}
