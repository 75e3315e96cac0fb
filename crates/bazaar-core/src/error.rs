// ── Core error types ──
//
// The cache stores `ResourceError` values as-is: a kind from a closed
// taxonomy plus the server's message. The `From<bazaar_api::Error>` impl
// is the only place transport failures are mapped onto that taxonomy.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// What went wrong, in terms of what the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// No usable response. Retried automatically.
    Network,
    /// Token missing, expired or refused. Sign in again.
    Auth,
    /// The server (or a local check) refused the input.
    Validation,
    /// The request conflicts with server state.
    Conflict,
    /// 5xx.
    Server,
    Unknown,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network)
    }

    pub fn needs_reauth(self) -> bool {
        matches!(self, Self::Auth)
    }

    pub fn needs_user_correction(self) -> bool {
        matches!(self, Self::Validation | Self::Conflict)
    }
}

/// A classified failure, as stored in a cache entry or returned from a
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ResourceError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ResourceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<bazaar_api::Error> for ResourceError {
    fn from(err: bazaar_api::Error) -> Self {
        use bazaar_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::new(ErrorKind::Auth, message),
            Api::SessionExpired { status, message } => {
                Self::new(ErrorKind::Auth, message).with_status(status)
            }
            Api::MissingToken => Self::new(ErrorKind::Auth, "not signed in"),
            Api::Transport(ref e) => match e.status() {
                Some(s) if s.is_server_error() => {
                    Self::new(ErrorKind::Server, err.to_string()).with_status(s.as_u16())
                }
                Some(s) => Self::new(ErrorKind::Validation, err.to_string()).with_status(s.as_u16()),
                None if e.is_decode() => Self::new(ErrorKind::Unknown, err.to_string()),
                None => Self::new(ErrorKind::Network, err.to_string()),
            },
            Api::Tls(message) => Self::new(ErrorKind::Network, message),
            Api::InvalidUrl(e) => Self::new(ErrorKind::Unknown, format!("invalid URL: {e}")),
            Api::Rejected { status, message } => {
                Self::new(ErrorKind::Validation, message).with_status(status)
            }
            Api::Conflict { status, message } => {
                Self::new(ErrorKind::Conflict, message).with_status(status)
            }
            Api::Server { status, message } => {
                Self::new(ErrorKind::Server, message).with_status(status)
            }
            Api::InvalidInput { reason, .. } => Self::new(ErrorKind::Validation, reason),
            Api::Deserialization { message, .. } => {
                Self::new(ErrorKind::Unknown, format!("unexpected response: {message}"))
            }
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Console is not running")]
    ConsoleStopped,

    #[error("Session store error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The taxonomy kind, for errors that came from the API.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Resource(e) => Some(e.kind),
            Self::NotSignedIn => Some(ErrorKind::Auth),
            _ => None,
        }
    }
}

impl From<bazaar_api::Error> for CoreError {
    fn from(err: bazaar_api::Error) -> Self {
        Self::Resource(err.into())
    }
}
