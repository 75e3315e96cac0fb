#![allow(clippy::unwrap_used)]
// End-to-end tests for `Console` against a wiremock back office.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bazaar_api::models::{DashboardStats, User};
use bazaar_api::{AdminProfile, AdminSession};
use bazaar_core::{
    AuthState, Command, Console, ConsoleConfig, CoreError, ErrorKind, MemorySessionStore, Resource,
    RevalidationConfig, SessionStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn admin() -> AdminProfile {
    AdminProfile {
        id: "adm1".into(),
        email: "admin@x.com".into(),
        name: "Admin".into(),
        role: "ADMIN".into(),
    }
}

fn config(server: &MockServer) -> ConsoleConfig {
    ConsoleConfig::new(Url::parse(&server.uri()).unwrap())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "abc", "admin": admin() }
        })))
        .mount(server)
        .await;
}

/// A started console, signed in as `admin@x.com` with token `abc`.
async fn signed_in(server: &MockServer) -> Console {
    mount_login(server).await;
    let console = Console::new(config(server)).unwrap();
    console.start().await.unwrap();
    console
        .sign_in("admin@x.com", SecretString::from("secret1".to_owned()))
        .await
        .unwrap();
    console
}

fn user(banned: bool) -> Value {
    json!({ "data": { "_id": "user123", "role": "USER", "isBanned": banned } })
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_then_dashboard_uses_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "totalUsers": 42, "totalRiders": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let console = signed_in(&server).await;
    assert_eq!(*console.auth_state().borrow(), AuthState::SignedIn);
    assert_eq!(console.current_admin().unwrap().email, "admin@x.com");

    let stats: DashboardStats = console.fetch_as(&Resource::Dashboard).await.unwrap();
    assert_eq!(stats.total_users, 42);
    assert_eq!(stats.total_riders, 7);
}

#[tokio::test]
async fn test_signed_out_subscriptions_are_inert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(0)
        .mount(&server)
        .await;

    let console = Console::new(config(&server)).unwrap();
    console.start().await.unwrap();

    let sub = console.subscribe(&Resource::Dashboard, RevalidationConfig::default());
    assert!(sub.key().is_none());
    assert!(sub.data().is_none());
    assert!(matches!(
        console.fetch(&Resource::Dashboard).await,
        Err(CoreError::NotSignedIn)
    ));
}

#[tokio::test]
async fn test_session_is_restored_from_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/get-category"))
        .and(header("authorization", "Bearer stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "_id": "cat1", "name": "Food" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::with_session(
        AdminSession::new("stored", admin()),
    ));
    let console = Console::with_session_store(config(&server), Some(store)).unwrap();
    assert_eq!(console.start().await.unwrap(), AuthState::SignedIn);

    let categories = console.fetch(&Resource::Categories).await.unwrap();
    assert_eq!(categories[0]["name"], "Food");
}

#[tokio::test]
async fn test_rejected_token_expires_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let console =
        Console::with_session_store(config(&server), Some(store.clone() as Arc<dyn SessionStore>))
            .unwrap();
    console.start().await.unwrap();
    console
        .sign_in("admin@x.com", SecretString::from("secret1".to_owned()))
        .await
        .unwrap();
    assert!(store.load().unwrap().is_some());

    let err = console.fetch(&Resource::Dashboard).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Auth));
    assert_eq!(*console.auth_state().borrow(), AuthState::Expired);
    assert!(!console.auth().is_authenticated());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let console = signed_in(&server).await;
    console.fetch(&Resource::Reports).await.unwrap();
    assert!(console.cache().contains(&Resource::Reports.key()));

    console.sign_out().unwrap();
    assert!(console.cache().is_empty());
    assert_eq!(*console.auth_state().borrow(), AuthState::SignedOut);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_requires_started_console() {
    let server = MockServer::start().await;
    let console = Console::new(config(&server)).unwrap();
    let err = console
        .execute(Command::BanUser { id: "user123".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ConsoleStopped));
}

#[tokio::test]
async fn test_ban_refetches_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/single-user/user123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user(false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/single-user/user123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user(true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/ban/user123"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "User banned"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let console = signed_in(&server).await;
    let resource = Resource::User("user123".into());
    let mut sub = console.subscribe(&resource, RevalidationConfig::manual());
    let before: User = sub.settled().await.decode().unwrap().unwrap();
    assert!(!before.is_banned);

    let ack = console
        .execute(Command::BanUser { id: "user123".into() })
        .await
        .unwrap();
    assert_eq!(ack["message"], "User banned");

    let after: User = sub.settled().await.decode().unwrap().unwrap();
    assert!(after.is_banned);
}

#[tokio::test]
async fn test_conflicting_delete_leaves_categories_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/get-category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "_id": "cat1", "name": "Food" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/delete-category/cat1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Category has listings"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let console = signed_in(&server).await;
    let mut sub = console.subscribe(&Resource::Categories, RevalidationConfig::manual());
    let before = sub.settled().await;

    let err = console
        .execute(Command::DeleteCategory { id: "cat1".into() })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    assert_eq!(err.to_string(), "Category has listings");

    let after = sub.state();
    assert!(!after.is_loading);
    assert_eq!(after.data, before.data);
    assert_eq!(*console.auth_state().borrow(), AuthState::SignedIn);
}
