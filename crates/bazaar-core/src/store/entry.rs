// ── Cache entries ──
//
// Lock order is always `entries` map shard, then entry `meta`, then the
// entry's `watch` channel. Nothing takes them in the other direction.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::fetch::SharedFetcher;
use crate::key::ResourceKey;
use crate::policy::{EntryPhase, EntryView, RevalidationConfig};
use crate::stream::{ResourceState, SubscriberId};

/// How a fetch ended, from the cache's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settled {
    /// The result was stored.
    Accepted,
    /// A later invalidation or local write made the result obsolete.
    Superseded,
    /// The cache was dropped before the fetch finished.
    Dropped,
}

/// Resolves once the fetch has finished and its result has been applied.
pub(crate) type Settle = Shared<BoxFuture<'static, Settled>>;

pub(crate) struct InFlight {
    pub seq: u64,
    pub done: Settle,
}

pub(crate) struct PollTask {
    pub every: Duration,
    pub cancel: CancellationToken,
}

pub(crate) struct EntryMeta {
    /// Sequence number for the next dispatched fetch.
    pub next_seq: u64,
    /// Completions with a lower sequence number are discarded.
    pub accept_from: u64,
    pub in_flight: Option<InFlight>,
    pub stale: bool,
    pub subscribers: HashMap<SubscriberId, RevalidationConfig>,
    pub fetcher: Option<SharedFetcher>,
    pub retry_attempt: u32,
    pub retry: Option<CancellationToken>,
    pub poll: Option<PollTask>,
    pub gc: Option<CancellationToken>,
    pub idle_since: Option<Instant>,
    pub last_success: Option<Instant>,
}

impl EntryMeta {
    fn new() -> Self {
        Self {
            next_seq: 0,
            accept_from: 0,
            in_flight: None,
            stale: false,
            subscribers: HashMap::new(),
            fetcher: None,
            retry_attempt: 0,
            retry: None,
            poll: None,
            gc: None,
            idle_since: None,
            last_success: None,
        }
    }

    /// Merged policy of the current subscribers.
    pub fn effective_config(&self) -> Option<RevalidationConfig> {
        RevalidationConfig::merge(self.subscribers.values())
    }

    /// Discard whatever is in flight when it completes.
    pub fn supersede_in_flight(&mut self) {
        if self.in_flight.is_some() {
            self.accept_from = self.next_seq;
        }
    }

    pub fn cancel_retry(&mut self) {
        if let Some(token) = self.retry.take() {
            token.cancel();
        }
    }

    pub fn cancel_gc(&mut self) {
        if let Some(token) = self.gc.take() {
            token.cancel();
        }
    }

    pub fn cancel_poll(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel.cancel();
        }
    }

    /// Eligible for eviction: nobody watching, nothing pending, and idle
    /// for at least `grace`.
    pub fn collectable(&self, now: Instant, grace: Duration) -> bool {
        self.subscribers.is_empty()
            && self.in_flight.is_none()
            && self.retry.is_none()
            && self
                .idle_since
                .is_some_and(|t| now.saturating_duration_since(t) >= grace)
    }

    /// Cut the entry loose from the cache: stop every timer, forget
    /// subscribers, and ignore the in-flight result.
    pub fn detach(&mut self) {
        self.cancel_retry();
        self.cancel_gc();
        self.cancel_poll();
        self.subscribers.clear();
        self.supersede_in_flight();
        self.stale = false;
        self.fetcher = None;
    }
}

pub(crate) struct CacheEntry {
    pub key: ResourceKey,
    pub state: watch::Sender<ResourceState>,
    meta: Mutex<EntryMeta>,
}

impl CacheEntry {
    pub fn new(key: ResourceKey) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            key,
            state,
            meta: Mutex::new(EntryMeta::new()),
        }
    }

    /// Lock the bookkeeping. A panic while holding the lock leaves the
    /// data consistent enough to keep going, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, EntryMeta> {
        self.meta.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ResourceState {
        self.state.borrow().clone()
    }

    pub fn view(&self, meta: &EntryMeta, online: bool) -> EntryView {
        let state = self.state.borrow();
        EntryView {
            phase: if meta.in_flight.is_some() {
                EntryPhase::Fetching
            } else {
                state.phase
            },
            has_data: state.data.is_some(),
            stale: meta.stale,
            last_success: meta.last_success,
            online,
        }
    }
}

/// The phase an entry rests in once nothing is in flight.
pub(crate) fn resting_phase(state: &ResourceState) -> EntryPhase {
    if state.error.is_some() {
        EntryPhase::Errored
    } else if state.data.is_some() {
        EntryPhase::Fresh
    } else {
        EntryPhase::Idle
    }
}
