use thiserror::Error;

/// Top-level error type for the `bazaar-api` crate.
///
/// Every HTTP failure is classified here, once, at the transport edge.
/// `bazaar-core` maps these into the cache's error taxonomy without
/// re-inspecting status codes or bodies.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, account disabled, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The server refused the bearer token (HTTP 401/403).
    #[error("Session expired -- sign in again ({message})")]
    SessionExpired { status: u16, message: String },

    /// The endpoint needs a bearer token and the auth context holds none.
    #[error("Not signed in -- no admin token available")]
    MissingToken,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server responses ────────────────────────────────────────────
    /// The server rejected the request with a structured message
    /// (4xx, or a `success: false` envelope).
    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request conflicts with server state, e.g. deleting a
    /// category that still has listings attached.
    #[error("Conflict (HTTP {status}): {message}")]
    Conflict { status: u16, message: String },

    /// 5xx from the server.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Local input ─────────────────────────────────────────────────
    /// Input failed validation before any request was sent.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the admin must sign in again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::SessionExpired { .. } | Self::MissingToken
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.status().is_none(),
            _ => false,
        }
    }

    /// The HTTP status behind this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired { status, .. }
            | Self::Rejected { status, .. }
            | Self::Conflict { status, .. }
            | Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_variants_report_expired() {
        assert!(Error::MissingToken.is_auth_expired());
        assert!(
            Error::SessionExpired {
                status: 401,
                message: "jwt expired".into()
            }
            .is_auth_expired()
        );
        assert!(
            !Error::Conflict {
                status: 400,
                message: "in use".into()
            }
            .is_auth_expired()
        );
    }

    #[test]
    fn status_is_exposed_for_server_answers() {
        let err = Error::Server {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(Error::invalid("email", "required").status(), None);
    }
}
