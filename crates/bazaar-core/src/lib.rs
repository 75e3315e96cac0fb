// bazaar-core: Resource cache, revalidation and mutation coordination
// between bazaar-api and consumers (CLI).

pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod fetch;
pub mod key;
pub mod mutation;
pub mod policy;
pub mod resource;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Command;
pub use config::ConsoleConfig;
pub use console::{AuthState, Console};
pub use error::{CoreError, ErrorKind, ResourceError};
pub use fetch::{Fetch, FetchFuture, SharedFetcher, fetcher};
pub use key::{Invalidation, KeyPart, ResourceKey};
pub use mutation::{MutationCoordinator, MutationResult};
pub use policy::{EntryPhase, RevalidationConfig, Trigger};
pub use resource::Resource;
pub use session::{MemorySessionStore, SessionStore};
pub use store::{CacheConfig, ResourceCache};
pub use stream::{ResourceState, ResourceStream, SubscriberId, Subscription};
