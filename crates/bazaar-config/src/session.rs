// Persisted admin sessions: the OS keyring or a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bazaar_api::{AdminProfile, AdminSession};
use bazaar_core::{CoreError, SessionStore};

/// On-disk / in-keyring shape of a session.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    admin: AdminProfile,
}

impl PersistedSession {
    fn encode(session: &AdminSession) -> Result<String, CoreError> {
        serde_json::to_string(&Self {
            token: session.token.expose_secret().to_owned(),
            admin: session.admin.clone(),
        })
        .map_err(store_error)
    }

    fn decode(raw: &str) -> Result<AdminSession, CoreError> {
        let persisted: Self = serde_json::from_str(raw).map_err(store_error)?;
        Ok(AdminSession::new(persisted.token, persisted.admin))
    }
}

fn store_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::Session {
        message: err.to_string(),
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Session in the OS credential store, one entry per profile.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
    account: String,
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>, profile_name: &str) -> Self {
        Self {
            service: service.into(),
            account: format!("{profile_name}/session"),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(&self.service, &self.account).map_err(store_error)
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<AdminSession>, CoreError> {
        match self.entry()?.get_password() {
            Ok(raw) => PersistedSession::decode(&raw).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }

    fn save(&self, session: &AdminSession) -> Result<(), CoreError> {
        let raw = PersistedSession::encode(session)?;
        self.entry()?.set_password(&raw).map_err(store_error)?;
        debug!(account = %self.account, "session saved to keyring");
        Ok(())
    }

    fn purge(&self) -> Result<(), CoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(store_error(e)),
        }
    }
}

// ── File ────────────────────────────────────────────────────────────

/// Session as a JSON file, readable by the owner only on Unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AdminSession>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => PersistedSession::decode(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }

    fn save(&self, session: &AdminSession) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(store_error)?;
        }
        std::fs::write(&self.path, PersistedSession::encode(session)?).map_err(store_error)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn purge(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(store_error)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}
