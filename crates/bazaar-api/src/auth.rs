use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const PASSWORD_MIN_LENGTH: usize = 6;
const PASSWORD_MAX_LENGTH: usize = 50;

/// The signed-in administrator, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// A bearer token plus the profile it was issued for.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: SecretString,
    pub admin: AdminProfile,
}

impl AdminSession {
    pub fn new(token: impl Into<String>, admin: AdminProfile) -> Self {
        Self {
            token: SecretString::from(token.into()),
            admin,
        }
    }
}

/// Explicit holder for the current admin session.
///
/// Passed to every API-calling function instead of living in ambient
/// global state. Cheap to clone: clones share the same slot, so
/// [`initialize()`](Self::initialize) and [`clear()`](Self::clear) are
/// visible to every holder.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    session: Arc<ArcSwapOption<AdminSession>>,
}

impl AuthContext {
    /// An empty (signed-out) context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that already holds `session`.
    pub fn with_session(session: AdminSession) -> Self {
        let ctx = Self::new();
        ctx.initialize(session);
        ctx
    }

    /// Install a session, replacing any previous one.
    pub fn initialize(&self, session: AdminSession) {
        self.session.store(Some(Arc::new(session)));
    }

    /// Drop the current session. Subsequent token-requiring calls fail
    /// with [`Error::MissingToken`].
    pub fn clear(&self) {
        self.session.store(None);
    }

    pub fn session(&self) -> Option<Arc<AdminSession>> {
        self.session.load_full()
    }

    pub fn admin(&self) -> Option<AdminProfile> {
        self.session().map(|s| s.admin.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.load().is_some()
    }

    /// `Authorization` header value for the current session.
    pub(crate) fn bearer(&self) -> Option<String> {
        let guard = self.session.load();
        Option::as_ref(&*guard).map(|s| format!("Bearer {}", s.token.expose_secret()))
    }
}

/// Credentials for the login endpoint.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into().trim().to_owned(),
            password,
        }
    }

    /// Check the form locally before anything goes over the wire.
    pub fn validate(&self) -> Result<(), Error> {
        if self.email.trim().is_empty() {
            return Err(Error::invalid("email", "Email is required."));
        }
        if !looks_like_email(&self.email) {
            return Err(Error::invalid(
                "email",
                "Please enter a valid email address.",
            ));
        }

        let password = self.password.expose_secret();
        if password.is_empty() {
            return Err(Error::invalid("password", "Password is required."));
        }
        let len = password.chars().count();
        if len < PASSWORD_MIN_LENGTH {
            return Err(Error::invalid(
                "password",
                format!("Password must be at least {PASSWORD_MIN_LENGTH} characters long."),
            ));
        }
        if len > PASSWORD_MAX_LENGTH {
            return Err(Error::invalid(
                "password",
                format!("Password must be less than {PASSWORD_MAX_LENGTH} characters."),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

/// `local@domain.tld` with no whitespace anywhere.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
