//! CLI configuration: thin wrapper around `bazaar_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --insecure, --timeout).

use std::sync::Arc;

use bazaar_config::{Config, Profile, config_path, load_config, profile_to_console_config};
use bazaar_core::{ConsoleConfig, SessionStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to open a console for the active profile.
pub struct Target {
    pub profile_name: String,
    pub console: ConsoleConfig,
    pub sessions: Arc<dyn SessionStore>,
    /// Email to offer at the login prompt.
    pub email: Option<String>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config and apply flag overrides to the active profile.
///
/// Without a matching profile, `--api-url` alone is enough; an
/// explicitly named profile must exist.
pub fn resolve(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            let url = global.api_url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url)
        }
    };

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = true;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    let console = profile_to_console_config(&profile, &cfg.defaults)?;
    let sessions = bazaar_config::session_store(&profile, &profile_name);
    tracing::debug!(profile = %profile_name, api = %console.api_url, "profile resolved");

    Ok(Target {
        profile_name,
        console,
        sessions,
        email: profile.email,
    })
}
