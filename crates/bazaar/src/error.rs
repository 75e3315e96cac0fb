//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bazaar_config::ConfigError;
use bazaar_core::{CoreError, ErrorKind, ResourceError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const SERVER: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API: {message}")]
    #[diagnostic(
        code(bazaar::network),
        help(
            "Check that the API is running and reachable.\n\
             Override the URL with --api-url, or use --insecure for self-signed staging servers."
        )
    )]
    Network { message: String },

    #[error("The server failed: {message}")]
    #[diagnostic(code(bazaar::server), help("Try again later; the request itself was accepted as valid."))]
    Server { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(code(bazaar::not_signed_in), help("Run: bazaar login"))]
    NotSignedIn,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(bazaar::auth),
        help("Your session may have expired. Run: bazaar login")
    )]
    Auth { message: String },

    // ── Server answers ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(bazaar::rejected))]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(bazaar::conflict),
        help("The record is still referenced elsewhere; resolve that first.")
    )]
    Conflict { message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(bazaar::unexpected))]
    Unexpected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bazaar::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bazaar::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bazaar config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(bazaar::no_config),
        help(
            "Create a profile with: bazaar config init\n\
             Or pass --api-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bazaar::config))]
    Config(ConfigError),

    #[error("Session storage failed: {message}")]
    #[diagnostic(code(bazaar::session))]
    Session { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bazaar::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => exit_code::CONNECTION,
            Self::Server { .. } => exit_code::SERVER,
            Self::NotSignedIn | Self::Auth { .. } => exit_code::AUTH,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::Rejected { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library errors → CliError ────────────────────────────────────────

impl From<ResourceError> for CliError {
    fn from(err: ResourceError) -> Self {
        let message = err.message;
        match err.kind {
            ErrorKind::Network => Self::Network { message },
            ErrorKind::Auth => Self::Auth { message },
            ErrorKind::Validation => Self::Rejected { message },
            ErrorKind::Conflict => Self::Conflict { message },
            ErrorKind::Server => Self::Server { message },
            ErrorKind::Unknown => Self::Unexpected { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Resource(e) => e.into(),
            CoreError::NotSignedIn => Self::NotSignedIn,
            CoreError::ConsoleStopped => Self::Unexpected {
                message: "console stopped before the command ran".into(),
            },
            CoreError::Session { message } => Self::Session { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl From<bazaar_api::Error> for CliError {
    fn from(err: bazaar_api::Error) -> Self {
        ResourceError::from(err).into()
    }
}
