// ── Session persistence seam ──
//
// The console hydrates the auth context from a store on start, saves on
// sign-in and purges on sign-out or expiry. Where the token actually
// lives (keyring, file) is the config crate's business.

use std::sync::{Mutex, PoisonError};

use bazaar_api::AdminSession;

use crate::error::CoreError;

pub trait SessionStore: Send + Sync {
    /// The persisted session, if any.
    fn load(&self) -> Result<Option<AdminSession>, CoreError>;

    fn save(&self, session: &AdminSession) -> Result<(), CoreError>;

    /// Forget the persisted session. Purging an empty store succeeds.
    fn purge(&self) -> Result<(), CoreError>;
}

/// Keeps the session for the life of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<AdminSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AdminSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<AdminSession>, CoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &AdminSession) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn purge(&self) -> Result<(), CoreError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
