// ── Resource cache API ──
//
// The only type consumers touch. Subscriptions, invalidation and focus /
// reconnect signals all resolve to entry transitions in `revalidate.rs`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::entry::{CacheEntry, Settled};
use crate::fetch::SharedFetcher;
use crate::key::{Invalidation, ResourceKey};
use crate::policy::{EntryPhase, RevalidationConfig, Trigger};
use crate::stream::{ResourceState, SubscriberId, Subscription};

const DEFAULT_GC_GRACE: Duration = Duration::from_secs(300);

/// Cache-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an unsubscribed, idle entry is kept before eviction.
    pub gc_grace: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            gc_grace: DEFAULT_GC_GRACE,
        }
    }
}

/// Keyed stale-while-revalidate cache with request deduplication.
///
/// Cheaply cloneable; clones share the same entries. All operations are
/// synchronous except [`revalidate()`](Self::revalidate); fetches run on
/// the ambient tokio runtime. Outside a runtime no fetch is started and
/// the entry settles with an [`ErrorKind::Unknown`](crate::ErrorKind) error.
#[derive(Clone, Default)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

pub(crate) struct CacheInner {
    pub(super) entries: DashMap<ResourceKey, Arc<CacheEntry>>,
    pub(super) config: CacheConfig,
    online: AtomicBool,
}

impl Default for CacheInner {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            config: CacheConfig::default(),
            online: AtomicBool::new(true),
        }
    }
}

impl CacheInner {
    pub(super) fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    fn get(&self, key: &ResourceKey) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    fn all(&self) -> Vec<Arc<CacheEntry>> {
        self.entries.iter().map(|e| Arc::clone(e.value())).collect()
    }

    pub(crate) fn unsubscribe(self: &Arc<Self>, key: &ResourceKey, id: SubscriberId) {
        let Some(entry) = self.get(key) else { return };
        let mut meta = entry.lock();
        if meta.subscribers.remove(&id).is_none() {
            return;
        }
        debug!(%key, subscriber = %id, remaining = meta.subscribers.len(), "unsubscribed");

        self.reschedule_poll(&entry, &mut meta);
        if meta.subscribers.is_empty() {
            meta.cancel_retry();
            self.schedule_gc_if_idle(&entry, &mut meta);
        }
    }

    pub(crate) async fn revalidate(self: &Arc<Self>, key: &ResourceKey) -> Option<ResourceState> {
        let entry = self.get(key)?;
        let mut pending = self
            .trigger(&entry, Trigger::Manual, None)
            .or_else(|| Self::in_flight(&entry));

        while let Some(done) = pending.take() {
            if done.await == Settled::Superseded {
                pending = Self::in_flight(&entry);
            }
        }
        Some(entry.snapshot())
    }

    pub(crate) fn mutate_local(self: &Arc<Self>, key: &ResourceKey, value: Value) {
        let entry = Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(CacheEntry::new(key.clone())))
                .value(),
        );
        let mut meta = entry.lock();
        meta.supersede_in_flight();
        meta.stale = false;
        let loading = meta.in_flight.is_some();
        entry.state.send_modify(|s| {
            s.data = Some(Arc::new(value));
            s.error = None;
            s.is_loading = loading;
            s.phase = if loading {
                EntryPhase::Fetching
            } else {
                EntryPhase::Fresh
            };
        });
        debug!(%key, "local mutation applied");

        if meta.subscribers.is_empty() && meta.gc.is_none() {
            self.schedule_gc_if_idle(&entry, &mut meta);
        }
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                ..CacheInner::default()
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a subscriber for `key` and return its handle.
    ///
    /// Fetches if the entry is missing or stale, or if `config` asks for
    /// a refresh on mount. A subscriber joining while a fetch is in
    /// flight shares that fetch. `None` yields an inert handle: no fetch,
    /// empty state.
    pub fn subscribe(
        &self,
        key: Option<ResourceKey>,
        fetcher: SharedFetcher,
        config: RevalidationConfig,
    ) -> Subscription {
        let Some(key) = key else {
            return Subscription::detached();
        };
        let id = SubscriberId::new();

        let entry = {
            let slot = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(CacheEntry::new(key.clone())));
            let entry = Arc::clone(slot.value());
            let mut meta = entry.lock();
            meta.subscribers.insert(id, config.clone());
            meta.fetcher = Some(fetcher);
            meta.idle_since = None;
            meta.cancel_gc();
            self.inner.reschedule_poll(&entry, &mut meta);
            drop(meta);
            entry
        };
        debug!(%key, subscriber = %id, "subscribed");

        self.inner.trigger(&entry, Trigger::Mount, Some(&config));
        Subscription::attached(
            Arc::downgrade(&self.inner),
            key,
            id,
            entry.state.subscribe(),
        )
    }

    /// Remove one subscriber. Data stays cached; an in-flight fetch runs
    /// to completion.
    pub fn unsubscribe(&self, key: &ResourceKey, id: SubscriberId) {
        self.inner.unsubscribe(key, id);
    }

    pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
        self.inner
            .get(key)
            .map_or(0, |e| e.lock().subscribers.len())
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Mark `key` stale; refetch now if it has subscribers.
    pub fn invalidate(&self, key: &ResourceKey) {
        if let Some(entry) = self.inner.get(key) {
            self.inner.invalidate_entry(&entry);
        }
    }

    /// Invalidate every cached key matching `predicate`. Returns how many
    /// entries were marked.
    pub fn invalidate_where(&self, predicate: impl Fn(&ResourceKey) -> bool) -> usize {
        let matching: Vec<_> = self
            .inner
            .all()
            .into_iter()
            .filter(|e| predicate(&e.key))
            .collect();
        for entry in &matching {
            self.inner.invalidate_entry(entry);
        }
        matching.len()
    }

    pub fn invalidate_path_prefix(&self, prefix: &str) -> usize {
        self.invalidate_where(|k| k.is_under(prefix))
    }

    pub fn apply(&self, invalidation: &Invalidation) -> usize {
        match invalidation {
            Invalidation::Key(key) => {
                let present = self.inner.get(key).is_some();
                self.invalidate(key);
                usize::from(present)
            }
            other => self.invalidate_where(|k| other.matches(k)),
        }
    }

    // ── Explicit refresh ─────────────────────────────────────────────

    /// Fetch `key` now (or join the fetch already running) and wait for
    /// the result to land. If that result is superseded, waits for the
    /// follow-up too. `None` if the key isn't cached.
    pub async fn revalidate(&self, key: &ResourceKey) -> Option<ResourceState> {
        self.inner.revalidate(key).await
    }

    /// Replace the cached value locally, without a request. A fetch
    /// already in flight is superseded.
    pub fn mutate_local(&self, key: &ResourceKey, value: Value) {
        self.inner.mutate_local(key, value);
    }

    // ── Environment signals ──────────────────────────────────────────

    /// The application regained focus.
    pub fn notify_focus(&self) {
        self.broadcast(Trigger::Focus);
    }

    /// Network connectivity came back.
    pub fn notify_reconnect(&self) {
        self.broadcast(Trigger::Reconnect);
    }

    /// Polling pauses while offline. Coming back online counts as a
    /// reconnect.
    pub fn set_online(&self, online: bool) {
        let was = self.inner.online.swap(online, Ordering::AcqRel);
        debug!(online, "connectivity changed");
        if online && !was {
            self.notify_reconnect();
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    fn broadcast(&self, trigger: Trigger) {
        for entry in self.inner.all() {
            self.inner.trigger(&entry, trigger, None);
        }
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Current state of `key` without subscribing.
    pub fn peek(&self, key: &ResourceKey) -> Option<ResourceState> {
        self.inner.get(key).map(|e| e.snapshot())
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.inner.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<_> = self.inner.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    // ── Eviction ─────────────────────────────────────────────────────

    /// Evict every entry that has been idle for the grace period.
    /// Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let grace = self.inner.config.gc_grace;
        let before = self.inner.entries.len();
        self.inner
            .entries
            .retain(|_, entry| !entry.lock().collectable(now, grace));
        let evicted = before.saturating_sub(self.inner.entries.len());
        if evicted > 0 {
            debug!(evicted, "garbage collected");
        }
        evicted
    }

    /// Drop every entry. Subscribers see an empty state; in-flight
    /// results are discarded.
    pub fn clear(&self) {
        let entries = self.inner.all();
        self.inner.entries.clear();
        for entry in &entries {
            entry.lock().detach();
            entry.state.send_replace(ResourceState::default());
        }
        debug!(count = entries.len(), "cache cleared");
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.inner.entries.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
