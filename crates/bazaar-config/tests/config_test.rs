#![allow(clippy::unwrap_used)]
// Config file round-trips and the file session store.

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use bazaar_api::{AdminProfile, AdminSession};
use bazaar_config::{
    Config, FileSessionStore, Profile, SessionStoreKind, load_config_from, save_config_to,
};
use bazaar_core::SessionStore;

fn admin() -> AdminProfile {
    AdminProfile {
        id: "adm1".into(),
        email: "admin@x.com".into(),
        name: "Admin".into(),
        role: "ADMIN".into(),
    }
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert(
        "staging".into(),
        Profile {
            email: Some("admin@x.com".into()),
            session_store: SessionStoreKind::File,
            listings_path: Some("/v2/listings".into()),
            ..Profile::new("https://staging.example.com")
        },
    );
    cfg.default_profile = Some("staging".into());
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (name, profile) = loaded.profile(None).unwrap();
    assert_eq!(name, "staging");
    assert_eq!(profile.api_url, "https://staging.example.com");
    assert_eq!(profile.session_store, SessionStoreKind::File);
    assert_eq!(profile.listings_path.as_deref(), Some("/v2/listings"));
    assert_eq!(loaded.defaults.timeout, 30);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded.default_profile.as_deref(), Some("default"));
    assert!(loaded.profiles.is_empty());
    assert_eq!(loaded.defaults.output, "table");
}

#[test]
fn hand_written_toml_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "prod"

[defaults]
output = "json"

[profiles.prod]
api_url = "https://api.example.com"
session_store = "memory"
timeout = 10
"#,
    )
    .unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.defaults.output, "json");
    let (_, prod) = loaded.profile(Some("prod")).unwrap();
    assert_eq!(prod.session_store, SessionStoreKind::Memory);
    assert_eq!(prod.timeout, Some(10));
    assert!(!prod.insecure);
}

#[test]
fn file_session_store_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("sessions").join("default.json"));

    assert!(store.load().unwrap().is_none());
    store.purge().unwrap();

    store.save(&AdminSession::new("abc", admin())).unwrap();
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.token.expose_secret(), "abc");
    assert_eq!(loaded.admin, admin());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    store.purge().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn corrupt_session_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = FileSessionStore::new(path);
    assert!(store.load().is_err());
}
