// ── Fetcher seam ──
//
// The cache doesn't know about HTTP. It calls a `Fetch` implementation
// with the key and stores whatever JSON or classified error comes back.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::ResourceError;
use crate::key::ResourceKey;

pub type FetchFuture = BoxFuture<'static, Result<Value, ResourceError>>;

/// Produces the value for a key.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, key: ResourceKey) -> FetchFuture;
}

impl<F, Fut> Fetch for F
where
    F: Fn(ResourceKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ResourceError>> + Send + 'static,
{
    fn fetch(&self, key: ResourceKey) -> FetchFuture {
        self(key).boxed()
    }
}

/// Shared handle to a fetcher, as stored on a cache entry.
pub type SharedFetcher = Arc<dyn Fetch>;

/// Wrap a closure (or any [`Fetch`]) for use with the cache.
pub fn fetcher(f: impl Fetch) -> SharedFetcher {
    Arc::new(f)
}
