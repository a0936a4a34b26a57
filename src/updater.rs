//! Background refresh scheduler for catalog resources.
//!
//! The [`UpdateScheduler`] owns one recurring refresh task per tracked key
//! plus a set of subscriber callbacks for that key. Each refresh fetches
//! fresh data from the [`CatalogProvider`], writes it into the
//! [`CacheStore`] under the resource class TTL, then invokes every
//! registered callback in registration order. A fetch failure is logged and
//! leaves the cache, the callbacks, and the timer untouched; the next tick
//! retries.
//!
//! Stopping a key cancels its timer but never aborts a refresh already in
//! flight; that refresh still writes its result and notifies whatever
//! callbacks remain registered at notify time.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, CachedValue, ResourceClass};
use crate::error::{Error, Result};
use crate::provider::CatalogProvider;

/// Cache and registration key for the trending list.
pub const TRENDING_KEY: &str = "trending-anime";

/// Cache and registration key for one series' details.
pub fn details_key(id: u64) -> String {
    format!("anime-details-{id}")
}

/// Cache and registration key for one series' episode list.
pub fn episodes_key(id: &str) -> String {
    format!("episodes-{id}")
}

/// A subscriber callback, identified by pointer for set semantics.
pub type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

/// Refresh periods and trending pagination for an [`UpdateScheduler`].
#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    /// Period between trending refreshes.
    pub trending_interval: Duration,
    /// Period between details refreshes.
    pub details_interval: Duration,
    /// Period between episode-list refreshes.
    pub episodes_interval: Duration,
    /// Page of the trending list to fetch.
    pub trending_page: u32,
    /// Trending page size.
    pub trending_per_page: u32,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            trending_interval: Duration::from_secs(10 * 60),
            details_interval: Duration::from_secs(30 * 60),
            episodes_interval: Duration::from_secs(5 * 60),
            trending_page: 1,
            trending_per_page: 24,
        }
    }
}

/// One resource the scheduler can keep fresh.
#[derive(Debug, Clone)]
enum Resource {
    Trending,
    Details(u64),
    Episodes(String),
}

impl Resource {
    fn key(&self) -> String {
        match self {
            Resource::Trending => TRENDING_KEY.to_string(),
            Resource::Details(id) => details_key(*id),
            Resource::Episodes(id) => episodes_key(id),
        }
    }

    fn class(&self) -> ResourceClass {
        match self {
            Resource::Trending => ResourceClass::Trending,
            Resource::Details(_) => ResourceClass::Details,
            Resource::Episodes(_) => ResourceClass::Episodes,
        }
    }
}

/// Outcome of invoking one subscriber callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackOutcome {
    Delivered,
    Panicked,
}

/// An active recurring refresh registration for one key.
struct Registration {
    token: CancellationToken,
}

struct SchedulerInner {
    cache: Arc<CacheStore>,
    provider: Arc<dyn CatalogProvider>,
    settings: UpdaterSettings,
    registrations: Mutex<HashMap<String, Registration>>,
    callbacks: Mutex<HashMap<String, Vec<UpdateCallback>>>,
}

/// Per-key recurring refresh tasks with subscriber notification.
///
/// Cheap to clone; all clones share the same registrations and callbacks.
#[derive(Clone)]
pub struct UpdateScheduler {
    inner: Arc<SchedulerInner>,
}

impl UpdateScheduler {
    /// Create a scheduler writing into `cache` and fetching via `provider`.
    pub fn new(
        cache: Arc<CacheStore>,
        provider: Arc<dyn CatalogProvider>,
        settings: UpdaterSettings,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                cache,
                provider,
                settings,
                registrations: Mutex::new(HashMap::new()),
                callbacks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start auto-updating the trending list.
    ///
    /// Replaces any existing trending task, adds `callback` to the key's
    /// subscriber set, refreshes immediately and unconditionally, then
    /// schedules a recurring refresh at the trending interval.
    pub async fn start_trending_updates(&self, callback: Option<UpdateCallback>) {
        self.start(Resource::Trending, callback, true).await;
    }

    /// Start auto-updating details for the series `id`.
    ///
    /// Same registration semantics as
    /// [`start_trending_updates`](Self::start_trending_updates), but the
    /// immediate refresh runs only when the cached entry is stale, so a
    /// freshly registered subscriber against a warm cache costs no fetch.
    pub async fn start_details_updates(&self, id: u64, callback: Option<UpdateCallback>) {
        let stale = self.inner.cache.is_stale(&details_key(id), None);
        self.start(Resource::Details(id), callback, stale).await;
    }

    /// Start auto-updating the episode list for the series `id`.
    ///
    /// Immediate refresh only when stale, like
    /// [`start_details_updates`](Self::start_details_updates).
    pub async fn start_episodes_updates(&self, id: &str, callback: Option<UpdateCallback>) {
        let stale = self.inner.cache.is_stale(&episodes_key(id), None);
        self.start(Resource::Episodes(id.to_string()), callback, stale)
            .await;
    }

    async fn start(&self, resource: Resource, callback: Option<UpdateCallback>, refresh_now: bool) {
        let key = resource.key();

        // Exactly one live task per key: claim the registration slot before
        // the immediate refresh suspends, cancelling whatever the insert
        // displaces. Two interleaved starts for the same key then race only
        // for the slot; the loser's token is cancelled and its task exits on
        // first poll. Callback sets are additive across re-registrations.
        let token = CancellationToken::new();
        let displaced = self.inner.registrations.lock().insert(
            key.clone(),
            Registration {
                token: token.clone(),
            },
        );
        if let Some(prev) = displaced {
            prev.token.cancel();
            debug!(key = %key, "Replaced existing update task");
        }

        if let Some(cb) = callback {
            let mut map = self.inner.callbacks.lock();
            let set = map.entry(key.clone()).or_default();
            if !set.iter().any(|existing| Arc::ptr_eq(existing, &cb)) {
                set.push(cb);
            }
        }

        if refresh_now {
            self.inner.refresh(&resource).await;
        }

        let inner = Arc::clone(&self.inner);
        let period = inner.interval_for(&resource);

        // If a `stop` or a competing `start` cancelled the token during the
        // refresh above, the select below observes it before the first tick.
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {}
                }
                // Cancellation is only observed between refreshes, so a stop
                // never aborts a fetch that has already been dispatched.
                inner.refresh(&resource).await;
            }
            debug!(key = %resource.key(), "Update task stopped");
        });
    }

    /// Stop the refresh task for `key` and discard its entire callback set.
    pub fn stop(&self, key: &str) {
        if let Some(reg) = self.inner.registrations.lock().remove(key) {
            reg.token.cancel();
            info!(key = %key, "Stopped auto-update");
        }
        self.inner.callbacks.lock().remove(key);
    }

    /// Stop every refresh task and clear all scheduler state.
    ///
    /// Must be invoked on process teardown so orphaned tasks do not keep
    /// fetching after the consuming context is gone. Idempotent.
    pub fn stop_all(&self) {
        let mut registrations = self.inner.registrations.lock();
        let stopped = registrations.len();
        for (_, reg) in registrations.drain() {
            reg.token.cancel();
        }
        drop(registrations);
        self.inner.callbacks.lock().clear();

        if stopped > 0 {
            info!(stopped = stopped, "Stopped all auto-updates");
        }
    }

    /// Remove one callback from `key`'s subscriber set by pointer identity.
    ///
    /// The refresh task keeps running even when the set becomes empty; timer
    /// lifecycle is independent of subscriber count so the cache stays warm
    /// for future subscribers.
    pub fn remove_callback(&self, key: &str, callback: &UpdateCallback) {
        if let Some(set) = self.inner.callbacks.lock().get_mut(key) {
            set.retain(|cb| !Arc::ptr_eq(cb, callback));
        }
    }

    /// Number of keys with a live refresh task.
    pub fn len(&self) -> usize {
        self.inner.registrations.lock().len()
    }

    /// Whether no refresh tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registrations.lock().is_empty()
    }
}

impl SchedulerInner {
    fn interval_for(&self, resource: &Resource) -> Duration {
        match resource {
            Resource::Trending => self.settings.trending_interval,
            Resource::Details(_) => self.settings.details_interval,
            Resource::Episodes(_) => self.settings.episodes_interval,
        }
    }

    /// Run one refresh pass for `resource`, logging the outcome.
    async fn refresh(&self, resource: &Resource) {
        let key = resource.key();
        match self.try_refresh(resource, &key).await {
            Ok(true) => debug!(key = %key, "Refresh complete"),
            Ok(false) => debug!(key = %key, "Refresh returned no data; cache unchanged"),
            Err(e) => {
                warn!(key = %key, error = %e, "Refresh failed; will retry on next tick");
            }
        }
    }

    /// Fetch, write, then notify. Returns whether a cache entry was written.
    ///
    /// The cache is updated only after the fetch fully succeeds, and
    /// callbacks fire strictly after the write, so an observer never sees a
    /// notification for data it cannot read back.
    async fn try_refresh(&self, resource: &Resource, key: &str) -> Result<bool> {
        let value = match resource {
            Resource::Trending => {
                let items = self
                    .provider
                    .fetch_trending(self.settings.trending_page, self.settings.trending_per_page)
                    .await
                    .map_err(Error::provider)?;
                info!(items = items.len(), "Fetched trending list");
                CachedValue::Trending(items)
            }
            Resource::Details(id) => {
                match self
                    .provider
                    .fetch_details(*id)
                    .await
                    .map_err(Error::provider)?
                {
                    Some(item) => CachedValue::Details(item),
                    None => return Ok(false),
                }
            }
            Resource::Episodes(id) => {
                let episodes = self
                    .provider
                    .fetch_episodes(id)
                    .await
                    .map_err(Error::provider)?;
                info!(key = %key, episodes = episodes.len(), "Fetched episode list");
                CachedValue::Episodes(episodes)
            }
        };

        let ttl = self.cache.ttl_for(resource.class());
        self.cache.set(key, value, Some(ttl));

        let outcomes = self.notify(key);
        let panicked = outcomes
            .iter()
            .filter(|o| **o == CallbackOutcome::Panicked)
            .count();
        if panicked > 0 {
            warn!(
                key = %key,
                panicked = panicked,
                delivered = outcomes.len() - panicked,
                "Subscriber callbacks panicked during notification"
            );
        }

        Ok(true)
    }

    /// Invoke every callback registered for `key`, in registration order.
    ///
    /// The callback set is read at notify time, not captured at dispatch
    /// time. A panicking callback is caught so it cannot break later
    /// callbacks or the refresh itself; per-callback outcomes are returned
    /// for the caller to log.
    fn notify(&self, key: &str) -> Vec<CallbackOutcome> {
        let callbacks: Vec<UpdateCallback> = self
            .callbacks
            .lock()
            .get(key)
            .map(|set| set.to_vec())
            .unwrap_or_default();

        callbacks
            .iter()
            .map(|cb| match catch_unwind(AssertUnwindSafe(|| cb())) {
                Ok(()) => CallbackOutcome::Delivered,
                Err(_) => CallbackOutcome::Panicked,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheTtls;
    use crate::types::{Episode, MediaItem, MediaTitle};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_item(id: u64) -> MediaItem {
        MediaItem {
            id,
            title: MediaTitle {
                romaji: "Test Anime".to_string(),
                english: None,
                native: "テストアニメ".to_string(),
            },
            description: None,
            cover_image: None,
            banner_image: None,
            genres: vec![],
            status: "RELEASING".to_string(),
            episodes: None,
            average_score: None,
            season_year: None,
            format: None,
            studios: vec![],
        }
    }

    fn sample_episodes() -> Vec<Episode> {
        vec![
            Episode {
                id: "e1".to_string(),
                title: None,
                number: 1,
                image: None,
                description: None,
            },
            Episode {
                id: "e2".to_string(),
                title: None,
                number: 2,
                image: None,
                description: None,
            },
        ]
    }

    /// Stub provider that counts fetches, can be told to fail, and can
    /// simulate a slow upstream so callers suspend at the fetch await.
    #[derive(Default)]
    struct StubProvider {
        trending_fetches: AtomicUsize,
        details_fetches: AtomicUsize,
        episodes_fetches: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
        details_absent: std::sync::atomic::AtomicBool,
        fetch_delay_ms: std::sync::atomic::AtomicU64,
    }

    impl StubProvider {
        async fn simulate_latency(&self) {
            let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }

    #[async_trait]
    impl CatalogProvider for StubProvider {
        async fn fetch_trending(
            &self,
            _page: u32,
            _per_page: u32,
        ) -> anyhow::Result<Vec<MediaItem>> {
            self.trending_fetches.fetch_add(1, Ordering::SeqCst);
            self.simulate_latency().await;
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("upstream unavailable");
            }
            Ok(vec![sample_item(1), sample_item(2)])
        }

        async fn fetch_details(&self, id: u64) -> anyhow::Result<Option<MediaItem>> {
            self.details_fetches.fetch_add(1, Ordering::SeqCst);
            self.simulate_latency().await;
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("upstream unavailable");
            }
            if self.details_absent.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(Some(sample_item(id)))
        }

        async fn fetch_episodes(&self, _id: &str) -> anyhow::Result<Vec<Episode>> {
            self.episodes_fetches.fetch_add(1, Ordering::SeqCst);
            self.simulate_latency().await;
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("upstream unavailable");
            }
            Ok(sample_episodes())
        }
    }

    fn scheduler_with(provider: Arc<StubProvider>) -> (UpdateScheduler, Arc<CacheStore>) {
        let cache = Arc::new(CacheStore::new(CacheTtls::default()));
        let scheduler = UpdateScheduler::new(
            Arc::clone(&cache),
            provider,
            UpdaterSettings::default(),
        );
        (scheduler, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn trending_start_fetches_immediately_and_on_interval() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_trending_updates(None).await;
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 1);
        assert!(cache.get(TRENDING_KEY).is_some());

        // One more fetch per 10 minute tick.
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn trending_immediate_refresh_is_unconditional() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_trending_updates(None).await;
        scheduler.start_trending_updates(None).await;
        // Warm cache does not suppress the trending kick-off fetch.
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_leaves_one_live_task() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_trending_updates(None).await;
        scheduler.start_trending_updates(None).await;
        assert_eq!(scheduler.len(), 1);
        let after_start = provider.trending_fetches.load(Ordering::SeqCst);

        // A duplicated timer would fetch twice per tick.
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        assert_eq!(
            provider.trending_fetches.load(Ordering::SeqCst),
            after_start + 1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_leave_one_live_timer() {
        let provider = Arc::new(StubProvider::default());
        provider.fetch_delay_ms.store(1_000, Ordering::SeqCst);
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        // Both starts suspend at the fetch await. The one whose registration
        // is displaced must have its timer cancelled, not leaked.
        tokio::join!(
            scheduler.start_details_updates(7, None),
            scheduler.start_details_updates(7, None),
        );
        assert_eq!(scheduler.len(), 1);
        let after_start = provider.details_fetches.load(Ordering::SeqCst);

        // A leaked second timer would fetch twice per 30 minute tick, and
        // stop() could never silence it.
        tokio::time::sleep(Duration::from_secs(30 * 60 + 2)).await;
        assert_eq!(
            provider.details_fetches.load(Ordering::SeqCst),
            after_start + 1
        );

        scheduler.stop(&details_key(7));
        let after_stop = provider.details_fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn details_skips_immediate_refresh_when_warm() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_details_updates(7, None).await;
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), 1);
        assert!(cache.get(&details_key(7)).is_some());

        // Cache is fresh, so re-registering must not fetch again.
        scheduler.start_details_updates(7, None).await;
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), 1);

        // Past the stale window the kick-off fetch happens again.
        tokio::time::advance(Duration::from_secs(3 * 60)).await;
        scheduler.start_details_updates(7, None).await;
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn details_absent_writes_nothing_and_stays_silent() {
        let provider = Arc::new(StubProvider::default());
        provider.details_absent.store(true, Ordering::SeqCst);
        let (scheduler, cache) = scheduler_with(Arc::clone(&provider));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let callback: UpdateCallback = Arc::new(move || {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.start_details_updates(404, Some(callback)).await;
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), 1);
        assert!(cache.get(&details_key(404)).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn episodes_refresh_writes_then_notifies_once() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, cache) = scheduler_with(Arc::clone(&provider));

        let calls = Arc::new(AtomicUsize::new(0));
        let cache_at_notify = Arc::clone(&cache);
        let calls_cb = Arc::clone(&calls);
        let callback: UpdateCallback = Arc::new(move || {
            // Ordering guarantee: the entry is readable before we are told.
            assert!(cache_at_notify.get(&episodes_key("42")).is_some());
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.start_episodes_updates("42", Some(callback)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let value = cache.get(&episodes_key("42")).unwrap();
        match value.as_ref() {
            CachedValue::Episodes(eps) => {
                assert_eq!(
                    eps.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
                    vec!["e1", "e2"]
                );
            }
            other => panic!("Expected episode list, got: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_callback_registration_is_a_noop() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let callback: UpdateCallback = Arc::new(move || {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });

        scheduler
            .start_trending_updates(Some(Arc::clone(&callback)))
            .await;
        scheduler.start_trending_updates(Some(callback)).await;

        // Two immediate refreshes, but the callback is registered once.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_callback_keeps_others_and_the_timer() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let first_cb = Arc::clone(&first_calls);
        let second_cb = Arc::clone(&second_calls);
        let first: UpdateCallback = Arc::new(move || {
            first_cb.fetch_add(1, Ordering::SeqCst);
        });
        let second: UpdateCallback = Arc::new(move || {
            second_cb.fetch_add(1, Ordering::SeqCst);
        });

        scheduler
            .start_trending_updates(Some(Arc::clone(&first)))
            .await;
        scheduler
            .start_trending_updates(Some(Arc::clone(&second)))
            .await;

        scheduler.remove_callback(TRENDING_KEY, &first);

        let first_before = first_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;

        assert_eq!(first_calls.load(Ordering::SeqCst), first_before);
        assert!(second_calls.load(Ordering::SeqCst) > 0);
        // Timer survives an empty set too.
        scheduler.remove_callback(TRENDING_KEY, &second);
        assert_eq!(scheduler.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_leaves_cache_unchanged_and_no_callback() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, cache) = scheduler_with(Arc::clone(&provider));

        // Seed a good entry, then make the provider fail.
        scheduler.start_details_updates(7, None).await;
        let before = cache.get(&details_key(7)).expect("seeded entry");
        scheduler.stop(&details_key(7));

        provider.fail.store(true, Ordering::SeqCst);
        // Force the entry stale so the kick-off fetch runs (and fails).
        tokio::time::advance(Duration::from_secs(3 * 60)).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let callback: UpdateCallback = Arc::new(move || {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.start_details_updates(7, Some(callback)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let after = cache.get(&details_key(7)).expect("entry must survive");
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_does_not_cancel_the_timer() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_trending_updates(None).await;
        provider.fail.store(true, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        let after_failure = provider.trending_fetches.load(Ordering::SeqCst);
        assert_eq!(after_failure, 2);

        // Fixed-interval retry: the next tick fetches again and recovers.
        provider.fail.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_callback_does_not_break_others() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        let survivor_calls = Arc::new(AtomicUsize::new(0));
        let survivor_cb = Arc::clone(&survivor_calls);
        let panicker: UpdateCallback = Arc::new(|| panic!("observer bug"));
        let survivor: UpdateCallback = Arc::new(move || {
            survivor_cb.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.start_trending_updates(Some(panicker)).await;
        scheduler.start_trending_updates(Some(survivor)).await;

        // Both immediate refreshes completed despite the panicking observer,
        // and the survivor (registered second) still ran.
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(survivor_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_callbacks_and_timer() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let callback: UpdateCallback = Arc::new(move || {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.start_trending_updates(Some(callback)).await;
        let after_start = calls.load(Ordering::SeqCst);

        scheduler.stop(TRENDING_KEY);
        assert!(scheduler.is_empty());

        tokio::time::sleep(Duration::from_secs(30 * 60)).await;
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), after_start);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_silences_everything() {
        let provider = Arc::new(StubProvider::default());
        let (scheduler, _cache) = scheduler_with(Arc::clone(&provider));

        scheduler.start_trending_updates(None).await;
        scheduler.start_details_updates(7, None).await;
        scheduler.start_episodes_updates("42", None).await;
        assert_eq!(scheduler.len(), 3);

        scheduler.stop_all();
        assert!(scheduler.is_empty());

        let trending = provider.trending_fetches.load(Ordering::SeqCst);
        let details = provider.details_fetches.load(Ordering::SeqCst);
        let episodes = provider.episodes_fetches.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        assert_eq!(provider.trending_fetches.load(Ordering::SeqCst), trending);
        assert_eq!(provider.details_fetches.load(Ordering::SeqCst), details);
        assert_eq!(provider.episodes_fetches.load(Ordering::SeqCst), episodes);

        // stop_all is idempotent.
        scheduler.stop_all();
    }
}
