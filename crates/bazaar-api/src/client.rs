// Back-office HTTP client
//
// Wraps `reqwest::Client` with area-prefixed URL construction, bearer
// authentication from an explicit `AuthContext`, and one place where
// HTTP outcomes become `Error` variants. Endpoint groups (users,
// listings, etc.) are inherent methods in `crate::endpoints`.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthContext;
use crate::error::Error;
use crate::models::Ack;
use crate::transport::TransportConfig;

/// The API is split into areas, each mounted under its own prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiArea {
    Admin,
    Listings,
    Vendor,
    Rider,
}

/// Path prefixes for each [`ApiArea`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiAreas {
    pub admin: String,
    pub listings: String,
    pub vendor: String,
    pub rider: String,
}

impl Default for ApiAreas {
    fn default() -> Self {
        Self {
            admin: "/api/admin".into(),
            listings: "/api/listings".into(),
            vendor: "/api/vendor".into(),
            rider: "/api/admin".into(),
        }
    }
}

impl ApiAreas {
    fn prefix(&self, area: ApiArea) -> &str {
        match area {
            ApiArea::Admin => &self.admin,
            ApiArea::Listings => &self.listings,
            ApiArea::Vendor => &self.vendor,
            ApiArea::Rider => &self.rider,
        }
    }
}

/// Whether a call needs the admin bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Required,
    Optional,
}

/// Raw HTTP client for the marketplace back-office API.
///
/// Every call resolves to exactly one of: a JSON payload, or a classified
/// [`Error`]. The envelope's `success: false` flag is honored even on a
/// 2xx status.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    areas: ApiAreas,
    auth: AuthContext,
}

impl AdminClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root (e.g. `https://api.example.com`).
    pub fn new(
        base_url: Url,
        areas: ApiAreas,
        auth: AuthContext,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            areas,
            auth,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, auth: AuthContext) -> Self {
        Self {
            http,
            base_url,
            areas: ApiAreas::default(),
            auth,
        }
    }

    pub fn with_areas(mut self, areas: ApiAreas) -> Self {
        self.areas = areas;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The auth context this client reads its bearer token from.
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}{area prefix}/{path}`
    pub(crate) fn url(&self, area: ApiArea, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.areas.prefix(area).trim_end_matches('/'),
            path.trim_start_matches('/'),
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get(&self, url: Url, auth: Auth) -> Result<Value, Error> {
        self.send(Method::GET, url, None::<&()>, auth).await
    }

    pub(crate) async fn post(
        &self,
        url: Url,
        body: &impl Serialize,
        auth: Auth,
    ) -> Result<Value, Error> {
        self.send(Method::POST, url, Some(body), auth).await
    }

    pub(crate) async fn patch(&self, url: Url, body: &impl Serialize) -> Result<Value, Error> {
        self.send(Method::PATCH, url, Some(body), Auth::Required)
            .await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<Value, Error> {
        self.send(Method::DELETE, url, None::<&()>, Auth::Required)
            .await
    }

    /// Send a multipart form (category create/edit).
    pub(crate) async fn send_multipart(
        &self,
        method: Method,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<Value, Error> {
        debug!("{method} {url} (multipart)");
        let req = self.authorize(self.http.request(method.clone(), url), Auth::Required)?;
        let resp = req.multipart(form).send().await.map_err(Error::Transport)?;
        Self::parse_response(&method, resp).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&impl Serialize>,
        auth: Auth,
    ) -> Result<Value, Error> {
        debug!("{method} {url}");
        let mut req = self.authorize(self.http.request(method.clone(), url), auth)?;
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(Error::Transport)?;
        Self::parse_response(&method, resp).await
    }

    fn authorize(
        &self,
        req: reqwest::RequestBuilder,
        auth: Auth,
    ) -> Result<reqwest::RequestBuilder, Error> {
        match (self.auth.bearer(), auth) {
            (Some(bearer), _) => Ok(req.header(reqwest::header::AUTHORIZATION, bearer)),
            (None, Auth::Optional) => Ok(req),
            (None, Auth::Required) => Err(Error::MissingToken),
        }
    }

    /// Classify the response. 2xx bodies are parsed as JSON (an empty
    /// body is `null`), then checked for a `success: false` envelope.
    async fn parse_response(method: &Method, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let err = classify_status(method, status, &body);
            warn!(status = status.as_u16(), "request failed: {err}");
            return Err(err);
        }

        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?
        };

        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(Error::Rejected {
                status: status.as_u16(),
                message: extract_message(&body)
                    .unwrap_or_else(|| "request was not successful".into()),
            });
        }

        Ok(value)
    }

    /// Decode a write response into an [`Ack`].
    pub(crate) fn ack(value: Value) -> Result<Ack, Error> {
        if value.is_null() {
            return Ok(Ack {
                success: true,
                ..Ack::default()
            });
        }
        let body = value.to_string();
        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Map a non-2xx status onto the error taxonomy.
///
/// A 400 on DELETE is how the server reports "still referenced" (for
/// instance a category with listings), so it is a conflict.
fn classify_status(method: &Method, status: StatusCode, body: &str) -> Error {
    let code = status.as_u16();
    let message = extract_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::SessionExpired {
            status: code,
            message,
        },
        StatusCode::CONFLICT => Error::Conflict {
            status: code,
            message,
        },
        StatusCode::BAD_REQUEST if *method == Method::DELETE => Error::Conflict {
            status: code,
            message,
        },
        s if s.is_server_error() => Error::Server {
            status: code,
            message,
        },
        _ => Error::Rejected {
            status: code,
            message,
        },
    }
}

/// Pull a human-readable message out of `{ "message": .. }` or
/// `{ "error": .. }`.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}
