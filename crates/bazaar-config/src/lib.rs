//! Shared configuration for the bazaar back office.
//!
//! TOML profiles merged with `BAZAAR_*` environment variables, translation
//! to `bazaar_core::ConsoleConfig`, and the session stores that keep an
//! admin signed in between runs.

mod session;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_api::{ApiAreas, TlsMode};
use bazaar_core::{CacheConfig, ConsoleConfig, MemorySessionStore, SessionStore};

pub use session::{FileSessionStore, KeyringSessionStore};

const KEYRING_SERVICE: &str = "bazaar";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is given on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named back-office profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Resolve `name` (or the default profile) to its settings.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// OS credential store.
    #[default]
    Keyring,
    /// JSON file under the platform data directory.
    File,
    /// Nothing persisted; sign in on every run.
    Memory,
}

/// A named back-office profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API root (e.g. "https://api.example.com").
    pub api_url: String,

    /// Admin email offered at the login prompt.
    pub email: Option<String>,

    /// Area prefix overrides. Unset areas use the server defaults.
    pub admin_path: Option<String>,
    pub listings_path: Option<String>,
    pub vendor_path: Option<String>,
    pub rider_path: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates (staging backends only).
    #[serde(default)]
    pub insecure: bool,

    /// Override the default timeout, in seconds.
    pub timeout: Option<u64>,

    #[serde(default)]
    pub session_store: SessionStoreKind,

    /// Seconds an unwatched cache entry survives.
    pub cache_grace: Option<u64>,
}

impl Profile {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    fn areas(&self) -> ApiAreas {
        let mut areas = ApiAreas::default();
        let overrides = [
            (&self.admin_path, &mut areas.admin),
            (&self.listings_path, &mut areas.listings),
            (&self.vendor_path, &mut areas.vendor),
            (&self.rider_path, &mut areas.rider),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }
        areas
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "bazaar", "bazaar")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Session file for `profile_name` when the file store is used.
pub fn session_path(profile_name: &str) -> PathBuf {
    let base = project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf());
    base.join("sessions").join(format!("{profile_name}.json"))
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bazaar");
    p
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the full config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `BAZAAR_*` variables. Nested keys use a
/// double underscore: `BAZAAR_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BAZAAR_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML at the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConsoleConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_console_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }

    let tls = if profile.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let mut cache = CacheConfig::default();
    if let Some(secs) = profile.cache_grace {
        cache.gc_grace = Duration::from_secs(secs);
    }

    Ok(ConsoleConfig {
        api_url: url,
        areas: profile.areas(),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        cache,
    })
}

/// The session store a profile asked for.
pub fn session_store(profile: &Profile, profile_name: &str) -> Arc<dyn SessionStore> {
    match profile.session_store {
        SessionStoreKind::Keyring => {
            Arc::new(KeyringSessionStore::new(KEYRING_SERVICE, profile_name))
        }
        SessionStoreKind::File => Arc::new(FileSessionStore::new(session_path(profile_name))),
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
    }
}
