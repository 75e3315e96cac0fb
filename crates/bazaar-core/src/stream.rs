// ── Subscriptions ──
//
// Consumer-side handles onto cache entries. A handle reads state from a
// `watch` channel and can only ask the cache for transitions.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::error::{ErrorKind, ResourceError};
use crate::key::ResourceKey;
use crate::policy::EntryPhase;
use crate::store::CacheInner;

/// Snapshot of one cache entry as consumers see it.
///
/// `data` survives failed refreshes: an entry can carry both the last
/// good value and the error from the latest attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceState {
    pub data: Option<Arc<Value>>,
    pub error: Option<ResourceError>,
    pub is_loading: bool,
    pub phase: EntryPhase,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl ResourceState {
    /// Deserialize the cached value. `None` if nothing is cached.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, ResourceError>> {
        self.data.as_deref().map(|value| {
            T::deserialize(value).map_err(|e| {
                ResourceError::new(ErrorKind::Unknown, format!("unexpected cached shape: {e}"))
            })
        })
    }
}

/// Identifies one subscriber on one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unsubscribes when dropped.
struct Link {
    cache: Weak<CacheInner>,
    key: ResourceKey,
    id: SubscriberId,
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.unsubscribe(&self.key, self.id);
        }
    }
}

/// A live view of one cache entry.
///
/// Dropping the handle unsubscribes. Handles created without a key are
/// inert: empty state, no fetches, `refresh()` is a no-op.
pub struct Subscription {
    link: Option<Link>,
    receiver: watch::Receiver<ResourceState>,
}

impl Subscription {
    pub(crate) fn attached(
        cache: Weak<CacheInner>,
        key: ResourceKey,
        id: SubscriberId,
        receiver: watch::Receiver<ResourceState>,
    ) -> Self {
        Self {
            link: Some(Link { cache, key, id }),
            receiver,
        }
    }

    pub(crate) fn detached() -> Self {
        let (_, receiver) = watch::channel(ResourceState::default());
        Self {
            link: None,
            receiver,
        }
    }

    pub fn key(&self) -> Option<&ResourceKey> {
        self.link.as_ref().map(|l| &l.key)
    }

    pub fn id(&self) -> Option<SubscriberId> {
        self.link.as_ref().map(|l| l.id)
    }

    pub fn state(&self) -> ResourceState {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<Value>> {
        self.receiver.borrow().data.clone()
    }

    pub fn error(&self) -> Option<ResourceError> {
        self.receiver.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, ResourceError>> {
        self.receiver.borrow().decode()
    }

    /// Wait for the next state change. `None` once the entry is gone.
    pub async fn changed(&mut self) -> Option<ResourceState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no fetch is in flight and return that state.
    pub async fn settled(&mut self) -> ResourceState {
        let settled = self
            .receiver
            .wait_for(|s| !s.is_loading)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Fetch now (or join the running fetch) and wait for the result.
    pub async fn refresh(&self) -> ResourceState {
        let Some((cache, key)) = self
            .link
            .as_ref()
            .and_then(|l| l.cache.upgrade().map(|c| (c, l.key.clone())))
        else {
            return self.state();
        };
        cache.revalidate(&key).await.unwrap_or_else(|| self.state())
    }

    /// Replace the cached value locally. Every subscriber of the key
    /// sees the change.
    pub fn mutate_local(&self, value: Value) {
        if let Some(link) = &self.link {
            if let Some(cache) = link.cache.upgrade() {
                cache.mutate_local(&link.key, value);
            }
        }
    }

    /// Adapt into a `Stream` yielding the current state, then every
    /// change. The subscription stays registered until the stream is
    /// dropped.
    pub fn into_stream(mut self) -> ResourceStream {
        ResourceStream {
            _link: self.link.take(),
            inner: WatchStream::new(self.receiver),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key().map(ToString::to_string))
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

/// `Stream` adapter over a [`Subscription`].
pub struct ResourceStream {
    _link: Option<Link>,
    inner: WatchStream<ResourceState>,
}

impl Stream for ResourceStream {
    type Item = ResourceState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
