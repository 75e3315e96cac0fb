// ── Mutation coordination ──
//
// Writes go straight to the server; the cache learns about them only
// through invalidation once the write has settled.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::error::ResourceError;
use crate::key::Invalidation;
use crate::store::ResourceCache;

/// Outcome of a write: the server's JSON, or a classified failure.
pub type MutationResult = Result<Value, ResourceError>;

/// Runs writes and invalidates what they touched.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    cache: ResourceCache,
}

impl MutationCoordinator {
    pub fn new(cache: ResourceCache) -> Self {
        Self { cache }
    }

    /// Await `write`; on success invalidate every key in `affected`.
    ///
    /// Invalidation never starts before the write settles. A failed write
    /// leaves the cache untouched and its error is returned as-is.
    pub async fn mutate<W>(&self, write: W, affected: &[Invalidation]) -> MutationResult
    where
        W: Future<Output = MutationResult>,
    {
        let result = write.await;
        match &result {
            Ok(_) => {
                let marked: usize = affected.iter().map(|inv| self.cache.apply(inv)).sum();
                debug!(invalidations = affected.len(), marked, "write applied");
            }
            Err(err) => {
                debug!(kind = %err.kind, error = %err, "write failed; cache untouched");
            }
        }
        result
    }
}
