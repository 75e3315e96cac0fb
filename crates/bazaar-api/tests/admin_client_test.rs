#![allow(clippy::unwrap_used)]
// Integration tests for `AdminClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bazaar_api::models::{CategoryForm, KycDecision};
use bazaar_api::{AdminClient, AdminProfile, AdminSession, AuthContext, Error, LoginRequest};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AdminClient::with_client(reqwest::Client::new(), base_url, AuthContext::new());
    (server, client)
}

async fn signed_in() -> (MockServer, AdminClient) {
    let (server, client) = setup().await;
    client.auth().initialize(AdminSession::new("abc", admin()));
    (server, client)
}

fn admin() -> AdminProfile {
    AdminProfile {
        id: "adm1".into(),
        email: "admin@x.com".into(),
        name: "Admin".into(),
        role: "ADMIN".into(),
    }
}

fn login_request(password: &str) -> LoginRequest {
    LoginRequest::new("admin@x.com", SecretString::from(password.to_owned()))
}

// ── Session tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_login_then_dashboard_sends_bearer() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .and(body_json(json!({ "email": "admin@x.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Login successful",
            "data": { "token": "abc", "admin": admin() }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "totalUsers": 12, "totalRiders": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client.login(&login_request("secret1")).await.unwrap();
    assert_eq!(session.admin.email, "admin@x.com");
    assert!(client.auth().is_authenticated());

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_users, 12);
    assert_eq!(stats.total_riders, 3);
}

#[tokio::test]
async fn test_login_rejected_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let result = client.login(&login_request("wrong-pass")).await;
    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.auth().is_authenticated());
}

#[tokio::test]
async fn test_login_validates_before_sending() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.login(&login_request("123")).await;
    assert!(matches!(
        result,
        Err(Error::InvalidInput {
            field: "password",
            ..
        })
    ));
}

#[tokio::test]
async fn test_logout_clears_token() {
    let (_server, client) = signed_in().await;
    client.logout();
    assert!(matches!(
        client.dashboard_stats().await,
        Err(Error::MissingToken)
    ));
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_expired_token_is_session_expired() {
    let (server, client) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })))
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(err.is_auth_expired(), "got {err:?}");
}

#[tokio::test]
async fn test_success_false_envelope_is_rejected() {
    let (server, client) = signed_in().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Unknown role"
        })))
        .mount(&server)
        .await;

    let err = client.update_user_role("u1", "WIZARD").await.unwrap_err();
    match err {
        Error::Rejected { status, message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "Unknown role");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_category_in_use_is_conflict() {
    let (server, client) = signed_in().await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/delete-category/cat1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Category has listings"
        })))
        .mount(&server)
        .await;

    let err = client.delete_category("cat1").await.unwrap_err();
    assert!(
        matches!(err, Error::Conflict { status: 400, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_server_error() {
    let (server, client) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/reports"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.reports().await.unwrap_err();
    assert!(matches!(err, Error::Server { status: 503, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Bind then release an ephemeral port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base_url = Url::parse(&format!("http://{addr}")).unwrap();

    let client = AdminClient::with_client(
        reqwest::Client::new(),
        base_url,
        AuthContext::with_session(AdminSession::new("abc", admin())),
    );
    let err = client.dashboard_stats().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient(), "got {err:?}");
}

// ── Resources ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_products_from_items_shape() {
    let (server, client) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "p1", "title": "Bike", "isDigital": false },
                { "id": "p2", "title": "E-book", "isDigital": true }
            ]
        })))
        .mount(&server)
        .await;

    let products = client.list_products().await.unwrap();
    let titles: Vec<_> = products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Bike", "E-book"]);
    assert!(products[1].is_digital);
}

#[tokio::test]
async fn test_rider_endpoints_live_under_admin_area() {
    let (server, client) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/rider-analytics/monthly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "2024-02": 4, "2024-01": 9 }
        })))
        .mount(&server)
        .await;

    let monthly = client.rider_monthly_stats().await.unwrap();
    let series = monthly.series();
    assert_eq!(series[0].month, "2024-01");
    assert_eq!(series[0].rides, 9);
}

#[tokio::test]
async fn test_vendor_reject_sends_note() {
    let (server, client) = signed_in().await;

    Mock::given(method("PATCH"))
        .and(path("/api/vendor/reject/v1"))
        .and(body_json(json!({ "note": "incomplete documents" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Vendor rejected"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.reject_vendor("v1", "incomplete documents").await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Vendor rejected"));
}

#[tokio::test]
async fn test_kyc_status_body() {
    let (server, client) = signed_in().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/kyc/status"))
        .and(body_json(json!({ "status": "APPROVED", "kycId": "k1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_kyc_status("k1", KycDecision::Approved)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_category_is_multipart() {
    let (server, client) = signed_in().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/add-category"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "id": "cat9", "name": "Shoes" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client
        .add_category(CategoryForm::new("Shoes", "Footwear"))
        .await
        .unwrap();
    assert_eq!(ack.data["id"], json!("cat9"));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("Footwear"));
}
