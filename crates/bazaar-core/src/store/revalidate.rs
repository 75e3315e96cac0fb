// ── Fetch dispatch and completion ──
//
// Everything that starts a fetch, applies its result, or arms a timer
// lives here. Callers hold the entry's `meta` lock; the functions only
// spawn work and never await.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use serde_json::Value;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cache::CacheInner;
use super::entry::{CacheEntry, EntryMeta, InFlight, PollTask, Settle, Settled, resting_phase};
use crate::error::{ErrorKind, ResourceError};
use crate::key::ResourceKey;
use crate::policy::{EntryPhase, RevalidationConfig, Trigger, retry_delay, should_revalidate};

impl CacheInner {
    /// Offer `trigger` to the policy and start a fetch if it agrees.
    ///
    /// `config` overrides the merged subscriber policy (a new subscriber
    /// is judged by its own configuration).
    pub(super) fn trigger(
        self: &Arc<Self>,
        entry: &Arc<CacheEntry>,
        trigger: Trigger,
        config: Option<&RevalidationConfig>,
    ) -> Option<Settle> {
        let mut meta = entry.lock();
        self.trigger_locked(entry, &mut meta, trigger, config)
    }

    fn trigger_locked(
        self: &Arc<Self>,
        entry: &Arc<CacheEntry>,
        meta: &mut EntryMeta,
        trigger: Trigger,
        config: Option<&RevalidationConfig>,
    ) -> Option<Settle> {
        let background = matches!(
            trigger,
            Trigger::Focus | Trigger::Reconnect | Trigger::Poll | Trigger::Retry
        );
        if background && meta.subscribers.is_empty() {
            return None;
        }

        let merged;
        let config = if let Some(c) = config {
            c
        } else {
            merged = meta
                .effective_config()
                .unwrap_or_else(RevalidationConfig::manual);
            &merged
        };

        let view = entry.view(meta, self.is_online());
        if !should_revalidate(trigger, config, &view, Instant::now()) {
            debug!(key = %entry.key, %trigger, phase = %view.phase, "revalidation skipped");
            return None;
        }
        self.start_fetch(entry, meta, trigger)
    }

    /// Mark stale. Refetch now if anyone is subscribed; if a fetch is
    /// already running, its result is discarded and one follow-up fetch
    /// runs when it settles.
    pub(super) fn invalidate_entry(self: &Arc<Self>, entry: &Arc<CacheEntry>) {
        let mut meta = entry.lock();
        meta.stale = true;

        if meta.in_flight.is_some() {
            meta.supersede_in_flight();
            debug!(key = %entry.key, "invalidated during fetch; follow-up queued");
            return;
        }
        if meta.subscribers.is_empty() {
            debug!(key = %entry.key, "invalidated; no subscribers");
            return;
        }
        self.start_fetch(entry, &mut meta, Trigger::Invalidate);
    }

    /// The running fetch for this entry, if any.
    pub(super) fn in_flight(entry: &CacheEntry) -> Option<Settle> {
        entry.lock().in_flight.as_ref().map(|f| f.done.clone())
    }

    fn start_fetch(
        self: &Arc<Self>,
        entry: &Arc<CacheEntry>,
        meta: &mut EntryMeta,
        trigger: Trigger,
    ) -> Option<Settle> {
        let Some(fetcher) = meta.fetcher.clone() else {
            debug!(key = %entry.key, "no fetcher registered");
            return None;
        };

        if tokio::runtime::Handle::try_current().is_err() {
            warn!(key = %entry.key, "no tokio runtime; fetch not started");
            entry.state.send_modify(|s| {
                s.error = Some(ResourceError::new(
                    ErrorKind::Unknown,
                    "no tokio runtime to drive the fetch",
                ));
                s.is_loading = false;
                s.phase = EntryPhase::Errored;
            });
            return None;
        }

        let seq = meta.next_seq;
        meta.next_seq += 1;
        if trigger != Trigger::Retry {
            meta.retry_attempt = 0;
            meta.cancel_retry();
        }
        debug!(key = %entry.key, seq, %trigger, "fetch started");

        let request = fetcher.fetch(entry.key.clone());
        let cache = Arc::downgrade(self);
        let target = Arc::clone(entry);
        let done: Settle = async move {
            let outcome = request.await;
            match cache.upgrade() {
                Some(inner) => inner.complete(&target, seq, outcome),
                None => Settled::Dropped,
            }
        }
        .boxed()
        .shared();

        meta.in_flight = Some(InFlight {
            seq,
            done: done.clone(),
        });
        entry.state.send_modify(|s| {
            s.is_loading = true;
            s.phase = EntryPhase::Fetching;
        });

        let driver = done.clone();
        spawn(async move {
            let _ = driver.await;
        });
        Some(done)
    }

    fn complete(
        self: &Arc<Self>,
        entry: &Arc<CacheEntry>,
        seq: u64,
        outcome: Result<Value, ResourceError>,
    ) -> Settled {
        let mut meta = entry.lock();
        if meta.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            meta.in_flight = None;
        }

        if seq < meta.accept_from {
            debug!(key = %entry.key, seq, "discarding superseded result");
            if meta.stale && !meta.subscribers.is_empty() {
                self.start_fetch(entry, &mut meta, Trigger::Invalidate);
            } else {
                entry.state.send_modify(|s| {
                    s.is_loading = false;
                    s.phase = resting_phase(s);
                });
                self.schedule_gc_if_idle(entry, &mut meta);
            }
            return Settled::Superseded;
        }

        meta.stale = false;
        match outcome {
            Ok(value) => {
                meta.retry_attempt = 0;
                meta.last_success = Some(Instant::now());
                entry.state.send_modify(|s| {
                    s.data = Some(Arc::new(value));
                    s.error = None;
                    s.is_loading = false;
                    s.phase = EntryPhase::Fresh;
                    s.last_fetched_at = Some(Utc::now());
                });
                debug!(key = %entry.key, seq, "fetch succeeded");
            }
            Err(err) => {
                let retry = meta
                    .effective_config()
                    .filter(|c| err.is_retryable() && meta.retry_attempt < c.retry_count);
                entry.state.send_modify(|s| {
                    s.error = Some(err.clone());
                    s.is_loading = false;
                    s.phase = EntryPhase::Errored;
                });

                if let Some(config) = retry {
                    let delay = retry_delay(config.retry_backoff, meta.retry_attempt);
                    meta.retry_attempt += 1;
                    warn!(
                        key = %entry.key,
                        attempt = meta.retry_attempt,
                        ?delay,
                        error = %err,
                        "fetch failed; retry scheduled"
                    );
                    self.schedule_retry(entry, &mut meta, delay);
                } else {
                    warn!(key = %entry.key, kind = %err.kind, error = %err, "fetch failed");
                }
            }
        }

        self.schedule_gc_if_idle(entry, &mut meta);
        Settled::Accepted
    }

    // ── Timers ───────────────────────────────────────────────────────

    fn schedule_retry(self: &Arc<Self>, entry: &Arc<CacheEntry>, meta: &mut EntryMeta, delay: Duration) {
        let token = CancellationToken::new();
        if let Some(old) = meta.retry.replace(token.clone()) {
            old.cancel();
        }

        let cache = Arc::downgrade(self);
        let target = Arc::downgrade(entry);
        spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let (Some(inner), Some(entry)) = (cache.upgrade(), target.upgrade()) {
                inner.fire_retry(&entry, &token);
            }
        });
    }

    fn fire_retry(self: &Arc<Self>, entry: &Arc<CacheEntry>, token: &CancellationToken) {
        let mut meta = entry.lock();
        if token.is_cancelled() {
            return;
        }
        meta.retry = None;
        self.trigger_locked(entry, &mut meta, Trigger::Retry, None);
    }

    /// Start, restart or stop the poll task so it matches the merged
    /// subscriber policy.
    pub(super) fn reschedule_poll(self: &Arc<Self>, entry: &Arc<CacheEntry>, meta: &mut EntryMeta) {
        let wanted = meta.effective_config().and_then(|c| c.poll_interval);
        if wanted == meta.poll.as_ref().map(|p| p.every) {
            return;
        }
        meta.cancel_poll();

        let Some(every) = wanted else {
            debug!(key = %entry.key, "polling stopped");
            return;
        };
        let cancel = CancellationToken::new();
        meta.poll = Some(PollTask {
            every,
            cancel: cancel.clone(),
        });
        debug!(key = %entry.key, ?every, "polling started");
        spawn(poll_task(
            Arc::downgrade(self),
            Arc::downgrade(entry),
            every,
            cancel,
        ));
    }

    /// Arm the eviction timer once nothing holds the entry.
    pub(super) fn schedule_gc_if_idle(self: &Arc<Self>, entry: &Arc<CacheEntry>, meta: &mut EntryMeta) {
        if !meta.subscribers.is_empty() || meta.in_flight.is_some() {
            return;
        }
        meta.idle_since = Some(Instant::now());

        let token = CancellationToken::new();
        if let Some(old) = meta.gc.replace(token.clone()) {
            old.cancel();
        }

        let grace = self.config.gc_grace;
        let cache = Arc::downgrade(self);
        let key = entry.key.clone();
        spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(grace) => {}
            }
            if let Some(inner) = cache.upgrade() {
                inner.evict_if_idle(&key);
            }
        });
    }

    pub(super) fn evict_if_idle(&self, key: &ResourceKey) -> bool {
        let now = Instant::now();
        let grace = self.config.gc_grace;
        let evicted = self
            .entries
            .remove_if(key, |_, entry| entry.lock().collectable(now, grace))
            .is_some();
        if evicted {
            debug!(%key, "evicted idle entry");
        }
        evicted
    }
}

async fn poll_task(
    cache: Weak<CacheInner>,
    entry: Weak<CacheEntry>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let (Some(inner), Some(entry)) = (cache.upgrade(), entry.upgrade()) else {
                    break;
                };
                inner.trigger(&entry, Trigger::Poll, None);
            }
        }
    }
}

/// Spawn on the ambient runtime. `start_fetch` refuses to begin without
/// one, so only timers (retry, poll, eviction) are lost here.
fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fut);
        }
        Err(_) => debug!("no tokio runtime; background task not started"),
    }
}
