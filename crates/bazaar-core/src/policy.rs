// ── Revalidation policy ──
//
// Pure decision logic: given a trigger, the subscribers' configuration and
// a snapshot of the entry, decide whether a fetch should start. The cache
// owns all timers and state; nothing here touches either.

use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::time::Instant;

const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_DEDUPE_INTERVAL: Duration = Duration::from_secs(2);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// When a subscription wants its entry refreshed. Chosen at the call
/// site and fixed for the lifetime of the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevalidationConfig {
    pub on_mount: bool,
    pub on_focus: bool,
    pub on_reconnect: bool,
    pub poll_interval: Option<Duration>,
    /// Automatic retries after a retryable failure.
    pub retry_count: u32,
    /// Base delay before the first retry; doubles each attempt.
    pub retry_backoff: Duration,
    /// Mount and focus triggers this soon after a successful fetch are
    /// skipped.
    pub dedupe_interval: Duration,
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            on_mount: true,
            on_focus: true,
            on_reconnect: true,
            poll_interval: None,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            dedupe_interval: DEFAULT_DEDUPE_INTERVAL,
        }
    }
}

impl RevalidationConfig {
    /// Fetch only when there is nothing cached, or when asked.
    pub fn manual() -> Self {
        Self {
            on_mount: false,
            on_focus: false,
            on_reconnect: false,
            poll_interval: None,
            retry_count: 0,
            ..Self::default()
        }
    }

    pub fn with_on_mount(mut self, on: bool) -> Self {
        self.on_mount = on;
        self
    }

    pub fn with_on_focus(mut self, on: bool) -> Self {
        self.on_focus = on;
        self
    }

    pub fn with_on_reconnect(mut self, on: bool) -> Self {
        self.on_reconnect = on;
        self
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = (!every.is_zero()).then_some(every);
        self
    }

    pub fn with_retry(mut self, count: u32, backoff: Duration) -> Self {
        self.retry_count = count;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_dedupe_interval(mut self, window: Duration) -> Self {
        self.dedupe_interval = window;
        self
    }

    /// Combine the configurations of every subscriber on one entry: a
    /// trigger is on if anyone enables it, the shortest poll interval and
    /// the largest retry budget win. `None` when there are no subscribers.
    pub fn merge<'a>(configs: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        configs.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => c.clone(),
                Some(a) => Self {
                    on_mount: a.on_mount || c.on_mount,
                    on_focus: a.on_focus || c.on_focus,
                    on_reconnect: a.on_reconnect || c.on_reconnect,
                    poll_interval: match (a.poll_interval, c.poll_interval) {
                        (Some(x), Some(y)) => Some(x.min(y)),
                        (x, y) => x.or(y),
                    },
                    retry_count: a.retry_count.max(c.retry_count),
                    retry_backoff: a.retry_backoff.min(c.retry_backoff),
                    dedupe_interval: a.dedupe_interval.min(c.dedupe_interval),
                },
            })
        })
    }
}

/// Why a fetch is being considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Trigger {
    Mount,
    Focus,
    Reconnect,
    Poll,
    Retry,
    Invalidate,
    Manual,
}

/// Lifecycle of one entry: `Idle -> Fetching -> {Fresh, Errored}`, and
/// back to `Fetching` on the next trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryPhase {
    #[default]
    Idle,
    Fetching,
    Fresh,
    Errored,
}

/// What the policy needs to know about an entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryView {
    pub phase: EntryPhase,
    pub has_data: bool,
    pub stale: bool,
    pub last_success: Option<Instant>,
    pub online: bool,
}

impl EntryView {
    fn within_dedupe(&self, window: Duration, now: Instant) -> bool {
        self.last_success
            .is_some_and(|t| now.saturating_duration_since(t) < window)
    }
}

/// Decide whether `trigger` should start a fetch.
///
/// Nothing fires while a fetch is in flight; invalidation is handled by
/// the cache before it gets here.
pub fn should_revalidate(
    trigger: Trigger,
    config: &RevalidationConfig,
    view: &EntryView,
    now: Instant,
) -> bool {
    if view.phase == EntryPhase::Fetching {
        return false;
    }
    match trigger {
        Trigger::Mount => {
            !view.has_data
                || view.stale
                || (config.on_mount && !view.within_dedupe(config.dedupe_interval, now))
        }
        Trigger::Focus => config.on_focus && !view.within_dedupe(config.dedupe_interval, now),
        Trigger::Reconnect => config.on_reconnect,
        Trigger::Poll => config.poll_interval.is_some() && view.online,
        Trigger::Retry | Trigger::Invalidate | Trigger::Manual => true,
    }
}

/// Backoff before retry number `attempt` (0-based): `base * 2^attempt`,
/// capped at 30 seconds.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1_u32 << attempt.min(16);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}
