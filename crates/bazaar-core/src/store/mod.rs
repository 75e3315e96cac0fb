// ── Resource cache ──
//
// Keyed stale-while-revalidate store. One `CacheEntry` per key; state is
// published through a `watch` channel, bookkeeping sits behind a short
// synchronous lock that is never held across an `.await`.

mod cache;
mod entry;
mod revalidate;

pub use cache::{CacheConfig, ResourceCache};
pub(crate) use cache::CacheInner;
