#![allow(clippy::unwrap_used)]
// Behavioral tests for `ResourceCache`, driven by in-process fetchers on
// a paused clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::time::sleep;

use bazaar_core::{
    CacheConfig, ErrorKind, Invalidation, MutationCoordinator, ResourceCache, ResourceError,
    ResourceKey, RevalidationConfig, SharedFetcher, fetcher,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Answers `{ "call": n }` after `delay`, counting calls.
fn counting(delay: Duration) -> (SharedFetcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let f = fetcher(move |_key: ResourceKey| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            sleep(delay).await;
            Ok::<_, ResourceError>(json!({ "call": n }))
        }
    });
    (f, calls)
}

/// Plays back `outcomes` in order, repeating the last one.
fn scripted(outcomes: Vec<Result<Value, ResourceError>>) -> (SharedFetcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let queue = Arc::new(Mutex::new(VecDeque::from(outcomes)));
    let f = fetcher(move |_key: ResourceKey| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut q = queue.lock().unwrap();
        let outcome = if q.len() > 1 {
            q.pop_front().unwrap()
        } else {
            q.front().cloned().unwrap()
        };
        async move { outcome }
    });
    (f, calls)
}

fn network_error() -> ResourceError {
    ResourceError::new(ErrorKind::Network, "connection refused")
}

fn key(path: &str) -> ResourceKey {
    ResourceKey::new(path)
}

fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

// ── Deduplication ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn concurrent_subscribers_share_one_request() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::from_millis(100));

    let mut subs: Vec<_> = (0..5)
        .map(|_| cache.subscribe(Some(key("/dashboard")), f.clone(), RevalidationConfig::default()))
        .collect();
    assert!(subs.iter().all(|s| s.is_loading()));

    for sub in &mut subs {
        let state = sub.settled().await;
        assert_eq!(state.data.as_deref(), Some(&json!({ "call": 1 })));
    }
    assert_eq!(calls(&count), 1);
    assert_eq!(cache.subscriber_count(&key("/dashboard")), 5);
}

#[tokio::test(start_paused = true)]
async fn missing_key_never_fetches() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);

    let sub = cache.subscribe(None, f, RevalidationConfig::default());
    let state = sub.state();
    assert!(state.data.is_none());
    assert!(state.error.is_none());
    assert!(!state.is_loading);
    assert!(sub.key().is_none());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(calls(&count), 0);
    assert!(cache.is_empty());
}

// ── Invalidation ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn invalidate_without_subscribers_waits_for_next_subscribe() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let k = key("/categories");

    let mut sub = cache.subscribe(Some(k.clone()), f.clone(), RevalidationConfig::manual());
    sub.settled().await;
    drop(sub);
    assert_eq!(cache.subscriber_count(&k), 0);

    cache.invalidate(&k);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(calls(&count), 1, "no subscriber, no request");
    assert_eq!(
        cache.peek(&k).unwrap().data.as_deref(),
        Some(&json!({ "call": 1 }))
    );

    // A manual-policy subscriber would normally reuse cached data; the
    // stale mark forces a fetch.
    let mut sub = cache.subscribe(Some(k), f, RevalidationConfig::manual());
    let state = sub.settled().await;
    assert_eq!(calls(&count), 2);
    assert_eq!(state.data.as_deref(), Some(&json!({ "call": 2 })));
}

#[tokio::test(start_paused = true)]
async fn invalidate_keeps_old_data_visible_while_loading() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::from_millis(50));
    let k = key("/users/u1");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    sub.settled().await;

    cache.invalidate(&k);
    let during = sub.state();
    assert!(during.is_loading);
    assert_eq!(during.data.as_deref(), Some(&json!({ "call": 1 })));

    let after = sub.settled().await;
    assert!(!after.is_loading);
    assert_eq!(after.data.as_deref(), Some(&json!({ "call": 2 })));
    assert_eq!(calls(&count), 2);
}

#[tokio::test(start_paused = true)]
async fn superseded_result_is_discarded() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::from_millis(100));
    let k = key("/listings");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    sleep(Duration::from_millis(10)).await;
    cache.invalidate(&k);
    assert_eq!(calls(&count), 1, "follow-up waits for the running fetch");

    // First fetch lands at 100ms and is thrown away; the follow-up runs.
    sleep(Duration::from_millis(150)).await;
    let mid = sub.state();
    assert!(mid.data.is_none());
    assert!(mid.is_loading);
    assert_eq!(calls(&count), 2);

    let state = sub.settled().await;
    assert_eq!(state.data.as_deref(), Some(&json!({ "call": 2 })));
}

#[tokio::test(start_paused = true)]
async fn path_invalidation_reaches_every_parameterization() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let all = key("/users");
    let riders = key("/users").with(vec!["RIDER"]);
    let other = key("/reports");

    let mut subs = vec![
        cache.subscribe(Some(all), f.clone(), RevalidationConfig::manual()),
        cache.subscribe(Some(riders), f.clone(), RevalidationConfig::manual()),
        cache.subscribe(Some(other), f, RevalidationConfig::manual()),
    ];
    for s in &mut subs {
        s.settled().await;
    }
    assert_eq!(calls(&count), 3);

    let marked = cache.apply(&Invalidation::path("/users"));
    assert_eq!(marked, 2);
    for s in &mut subs {
        s.settled().await;
    }
    assert_eq!(calls(&count), 5);
}

// ── Errors and retries ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_last_good_data() {
    let cache = ResourceCache::new();
    let (f, count) = scripted(vec![
        Ok(json!(["a", "b"])),
        Err(ResourceError::new(ErrorKind::Server, "bad gateway").with_status(502)),
    ]);
    let k = key("/reports");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::default());
    sub.settled().await;

    cache.invalidate(&k);
    let state = sub.settled().await;
    assert_eq!(state.data.as_deref(), Some(&json!(["a", "b"])));
    let err = state.error.unwrap();
    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.status, Some(502));

    // Server errors are surfaced, not retried.
    sleep(Duration::from_secs(120)).await;
    assert_eq!(calls(&count), 2);
}

#[tokio::test(start_paused = true)]
async fn network_failures_retry_with_backoff_until_budget_is_spent() {
    let cache = ResourceCache::new();
    let (f, count) = scripted(vec![Err(network_error())]);
    let config = RevalidationConfig::manual().with_retry(2, Duration::from_secs(1));

    let sub = cache.subscribe(Some(key("/kyc")), f, config);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls(&count), 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(calls(&count), 2, "first retry after 1s");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(calls(&count), 3, "second retry after 2 more seconds");

    sleep(Duration::from_secs(60)).await;
    assert_eq!(calls(&count), 3, "budget spent");
    assert_eq!(sub.error().unwrap().kind, ErrorKind::Network);
}

#[tokio::test(start_paused = true)]
async fn retry_recovers_and_clears_error() {
    let cache = ResourceCache::new();
    let (f, count) = scripted(vec![Err(network_error()), Ok(json!({ "ok": true }))]);
    let config = RevalidationConfig::manual().with_retry(3, Duration::from_secs(1));

    let sub = cache.subscribe(Some(key("/riders")), f, config);
    sleep(Duration::from_secs(5)).await;

    let state = sub.state();
    assert_eq!(calls(&count), 2);
    assert!(state.error.is_none());
    assert_eq!(state.data.as_deref(), Some(&json!({ "ok": true })));
}

#[tokio::test(start_paused = true)]
async fn pending_retry_is_dropped_with_last_subscriber() {
    let cache = ResourceCache::new();
    let (f, count) = scripted(vec![Err(network_error())]);
    let config = RevalidationConfig::manual().with_retry(5, Duration::from_secs(1));

    let sub = cache.subscribe(Some(key("/kyc")), f, config);
    sleep(Duration::from_millis(10)).await;
    drop(sub);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(calls(&count), 1);
}

// ── Polling and environment signals ─────────────────────────────────

#[tokio::test(start_paused = true)]
async fn polling_runs_while_subscribed() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let config = RevalidationConfig::manual().with_poll_interval(Duration::from_secs(10));

    let sub = cache.subscribe(Some(key("/dashboard")), f, config);
    sleep(Duration::from_secs(35)).await;
    assert_eq!(calls(&count), 4, "mount plus ticks at 10s, 20s, 30s");

    drop(sub);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(calls(&count), 4);
}

#[tokio::test(start_paused = true)]
async fn polling_pauses_offline() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let config = RevalidationConfig::manual().with_poll_interval(Duration::from_secs(10));

    let _sub = cache.subscribe(Some(key("/dashboard")), f, config);
    sleep(Duration::from_millis(10)).await;
    cache.set_online(false);
    sleep(Duration::from_secs(35)).await;
    assert_eq!(calls(&count), 1);

    cache.set_online(true);
    sleep(Duration::from_secs(11)).await;
    assert_eq!(calls(&count), 2);
}

#[tokio::test(start_paused = true)]
async fn focus_and_reconnect_respect_each_policy() {
    let cache = ResourceCache::new();
    let (eager_f, eager) = counting(Duration::ZERO);
    let (lazy_f, lazy) = counting(Duration::ZERO);

    let _a = cache.subscribe(Some(key("/dashboard")), eager_f, RevalidationConfig::default());
    let _b = cache.subscribe(Some(key("/reports")), lazy_f, RevalidationConfig::manual());
    sleep(Duration::from_millis(10)).await;

    // Inside the dedupe window nothing happens.
    cache.notify_focus();
    sleep(Duration::from_millis(10)).await;
    assert_eq!((calls(&eager), calls(&lazy)), (1, 1));

    sleep(Duration::from_secs(5)).await;
    cache.notify_focus();
    sleep(Duration::from_millis(10)).await;
    assert_eq!((calls(&eager), calls(&lazy)), (2, 1));

    cache.notify_reconnect();
    sleep(Duration::from_millis(10)).await;
    assert_eq!((calls(&eager), calls(&lazy)), (3, 1));
}

// ── Local writes and streams ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn local_mutation_is_seen_by_every_subscriber() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let k = key("/categories");

    let mut a = cache.subscribe(Some(k.clone()), f.clone(), RevalidationConfig::manual());
    let b = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    a.settled().await;

    b.mutate_local(json!([{ "id": "c1" }]));
    assert_eq!(a.data().as_deref(), Some(&json!([{ "id": "c1" }])));
    assert_eq!(calls(&count), 1);
}

#[tokio::test(start_paused = true)]
async fn stream_yields_current_state_then_changes() {
    let cache = ResourceCache::new();
    let (f, _count) = counting(Duration::from_millis(20));
    let k = key("/riders");

    let sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    let mut stream = sub.into_stream();

    let first = stream.next().await.unwrap();
    assert!(first.is_loading);
    let second = stream.next().await.unwrap();
    assert_eq!(second.data.as_deref(), Some(&json!({ "call": 1 })));
    assert_eq!(cache.subscriber_count(&k), 1);

    drop(stream);
    assert_eq!(cache.subscriber_count(&k), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_forces_a_fetch_and_returns_the_result() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::from_millis(5));

    let mut sub = cache.subscribe(Some(key("/kyc")), f, RevalidationConfig::manual());
    sub.settled().await;

    let state = sub.refresh().await;
    assert_eq!(state.data.as_deref(), Some(&json!({ "call": 2 })));
    assert_eq!(calls(&count), 2);
}

// ── Eviction ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn idle_entries_are_evicted_after_grace() {
    let cache = ResourceCache::with_config(CacheConfig {
        gc_grace: Duration::from_secs(60),
    });
    let (f, _count) = counting(Duration::ZERO);
    let k = key("/reports");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    sub.settled().await;
    drop(sub);

    sleep(Duration::from_secs(59)).await;
    assert!(cache.contains(&k));
    assert_eq!(cache.collect_garbage(), 0);

    sleep(Duration::from_secs(2)).await;
    assert!(!cache.contains(&k));
}

#[tokio::test(start_paused = true)]
async fn resubscribing_cancels_eviction() {
    let cache = ResourceCache::with_config(CacheConfig {
        gc_grace: Duration::from_secs(60),
    });
    let (f, count) = counting(Duration::ZERO);
    let k = key("/reports");

    drop(cache.subscribe(Some(k.clone()), f.clone(), RevalidationConfig::manual()));
    sleep(Duration::from_secs(30)).await;
    let _sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());

    sleep(Duration::from_secs(120)).await;
    assert!(cache.contains(&k));
    assert_eq!(calls(&count), 1, "cached data reused");
}

#[tokio::test(start_paused = true)]
async fn clear_resets_subscribers_to_empty() {
    let cache = ResourceCache::new();
    let (f, _count) = counting(Duration::ZERO);

    let mut sub = cache.subscribe(Some(key("/dashboard")), f, RevalidationConfig::manual());
    sub.settled().await;
    cache.clear();

    assert!(cache.is_empty());
    assert!(sub.data().is_none());
}

// ── Mutation coordination ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn mutation_invalidates_only_after_write_settles() {
    let cache = ResourceCache::new();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let fetch_log = Arc::clone(&log);
    let f = fetcher(move |_key: ResourceKey| {
        fetch_log.lock().unwrap().push("fetch");
        async { Ok::<_, ResourceError>(json!({})) }
    });
    let k = key("/users/user123");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    sub.settled().await;

    let coordinator = MutationCoordinator::new(cache.clone());
    let write_log = Arc::clone(&log);
    let result = coordinator
        .mutate(
            async move {
                sleep(Duration::from_millis(100)).await;
                write_log.lock().unwrap().push("write");
                Ok::<_, ResourceError>(json!({ "success": true }))
            },
            &[Invalidation::Key(k)],
        )
        .await;

    assert!(result.is_ok());
    sub.settled().await;
    assert_eq!(*log.lock().unwrap(), vec!["fetch", "write", "fetch"]);
}

#[tokio::test(start_paused = true)]
async fn failed_mutation_leaves_cache_untouched() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);
    let k = key("/categories");

    let mut sub = cache.subscribe(Some(k.clone()), f, RevalidationConfig::manual());
    let before = sub.settled().await;

    let coordinator = MutationCoordinator::new(cache.clone());
    let err = coordinator
        .mutate(
            async {
                Err::<Value, _>(ResourceError::new(ErrorKind::Conflict, "Category has listings"))
            },
            &[Invalidation::Key(k.clone())],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(calls(&count), 1);
    assert_eq!(cache.peek(&k).unwrap().data, before.data);
}

// ── Runtime ─────────────────────────────────────────────────────────

#[test]
fn subscribing_outside_a_runtime_reports_an_error() {
    let cache = ResourceCache::new();
    let (f, count) = counting(Duration::ZERO);

    let sub = cache.subscribe(Some(key("/dashboard")), f, RevalidationConfig::default());
    let state = sub.state();

    assert!(!state.is_loading);
    assert!(state.data.is_none());
    assert_eq!(state.error.unwrap().kind, ErrorKind::Unknown);
    assert_eq!(calls(&count), 0);
}
