// Back-office API response types
//
// The admin API is inconsistent: most endpoints wrap payloads in
// `{ success, message, data }`, some return bare arrays, the product
// listing has used `data`, `products` and `items` over time. Each shape
// is resolved here, once, into a single typed value. Fields use
// `#[serde(default)]` liberally and keep unknown keys in `extra` so
// nothing the server sends is lost on the way to the cache.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::Error;

type Extra = Map<String, Value>;

// ── Envelopes ────────────────────────────────────────────────────────

/// Standard `{ success, message, data }` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Acknowledgement returned by write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub success: bool,
    pub message: Option<String>,
    pub data: Value,
}

/// Single-object payloads, with or without the envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemPayload<T> {
    Wrapped(Envelope<T>),
    Bare(T),
}

/// List payloads in every shape the API has been seen to return.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Products { products: Vec<T> },
    Items { items: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(v)
            | Self::Data { data: v }
            | Self::Products { products: v }
            | Self::Items { items: v } => v,
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Unwrap `{ data: T }` (or a bare `T`).
pub fn normalize_item<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    decode::<ItemPayload<T>>(value).map(|p| match p {
        ItemPayload::Wrapped(env) => env.data,
        ItemPayload::Bare(item) => item,
    })
}

/// Strictly enveloped payloads (`data` must be present).
pub fn normalize_envelope<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    decode::<Envelope<T>>(value).map(|env| env.data)
}

/// Any list shape into a `Vec<T>`.
pub fn normalize_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, Error> {
    decode::<ListPayload<T>>(value).map(ListPayload::into_vec)
}

pub fn normalize_products(value: Value) -> Result<Vec<Product>, Error> {
    normalize_list(value)
}

// ── Dashboard ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_riders: u64,
    pub total_vendors: u64,
    pub total_deliveries: u64,
    pub recent_activity: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ── Users ────────────────────────────────────────────────────────────

/// Role name the server uses for back-office accounts.
pub const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub created_at: Option<String>,
    pub is_banned: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Keep users whose role is in `roles`, never administrators.
/// An empty filter keeps everyone.
pub fn filter_users_by_role(users: Vec<User>, roles: &[String]) -> Vec<User> {
    if roles.is_empty() {
        return users;
    }
    users
        .into_iter()
        .filter(|u| u.role != ADMIN_ROLE && roles.iter().any(|r| *r == u.role))
        .collect()
}

// ── Riders ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderCounts {
    pub deliveries: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rider {
    #[serde(alias = "_id")]
    pub id: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub status: Option<RiderStatus>,
    pub is_online: bool,
    pub last_seen_at: Option<String>,
    #[serde(rename = "_count")]
    pub counts: Option<RiderCounts>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderList {
    pub riders: Vec<Rider>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RideStats {
    pub total_deliveries: u64,
    pub total_riders: u64,
    pub approved: u64,
    pub pending: u64,
    pub rejected: u64,
    pub top_riders: Vec<Rider>,
}

/// Deliveries per month, keyed by the server's month label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyStats(pub BTreeMap<String, u64>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRides {
    pub month: String,
    pub rides: u64,
}

impl MonthlyStats {
    /// Months in chronological order. Labels that don't parse as a
    /// month sort after the ones that do, alphabetically.
    pub fn series(&self) -> Vec<MonthlyRides> {
        let mut rows: Vec<(Option<NaiveDate>, MonthlyRides)> = self
            .0
            .iter()
            .map(|(month, rides)| {
                (
                    parse_month(month),
                    MonthlyRides {
                        month: month.clone(),
                        rides: *rides,
                    },
                )
            })
            .collect();
        rows.sort_by(|(a, ra), (b, rb)| match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ra.month.cmp(&rb.month),
        });
        rows.into_iter().map(|(_, r)| r).collect()
    }
}

fn parse_month(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("1 {label}"), "%d %B %Y"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("1 {label}"), "%d %b %Y"))
        .ok()
}

// ── Listings ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraDetail {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seller {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub is_digital: bool,
    pub condition: Option<String>,
    pub stock: Option<i64>,
    pub seller_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub extra_details: Vec<ExtraDetail>,
    pub seller: Option<Seller>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ── Vendors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VendorApplication {
    #[serde(alias = "_id")]
    pub id: String,
    pub business_name: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vendor {
    #[serde(alias = "_id")]
    pub id: String,
    pub business_name: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ── KYC ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// The two outcomes an admin can record for a KYC request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum KycDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KycRequest {
    #[serde(alias = "_id")]
    pub id: String,
    pub status: Option<KycStatus>,
    pub user_id: Option<String>,
    pub document_type: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Report {
    #[serde(alias = "_id")]
    pub id: String,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub reporter_id: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ── Categories ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An image file attached to a category form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl CategoryImage {
    /// Read an image from disk, guessing the MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::invalid("image", format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_owned();
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
                "png" => Some("image/png"),
                "jpg" | "jpeg" => Some("image/jpeg"),
                "webp" => Some("image/webp"),
                "gif" => Some("image/gif"),
                "svg" => Some("image/svg+xml"),
                _ => None,
            })
            .map(str::to_owned);
        Ok(Self {
            file_name,
            bytes,
            mime,
        })
    }
}

/// Fields for creating or editing a category. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<CategoryImage>,
}

impl CategoryForm {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            image: None,
        }
    }

    pub fn with_image(mut self, image: CategoryImage) -> Self {
        self.image = Some(image);
        self
    }

    /// A new category needs both a name and a description.
    pub fn validate_new(&self) -> Result<(), Error> {
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(Error::invalid("name", "Category name is required."));
        }
        if self
            .description
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
        {
            return Err(Error::invalid(
                "description",
                "Category description is required.",
            ));
        }
        Ok(())
    }

    /// An edit must change at least one field.
    pub fn validate_edit(&self) -> Result<(), Error> {
        if self.name.is_none() && self.description.is_none() && self.image.is_none() {
            return Err(Error::invalid("category", "Nothing to update."));
        }
        Ok(())
    }

    pub(crate) fn into_multipart(self) -> Result<reqwest::multipart::Form, Error> {
        let mut form = reqwest::multipart::Form::new();
        if let Some(name) = self.name {
            form = form.text("name", name);
        }
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if let Some(image) = self.image {
            let mut part =
                reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name);
            if let Some(mime) = image.mime {
                part = part.mime_str(&mime)?;
            }
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn products_normalize_from_every_shape() {
        let product = json!({ "id": "p1", "title": "Bike", "priceCents": 1500 });
        for body in [
            json!([product]),
            json!({ "success": true, "data": [product] }),
            json!({ "products": [product] }),
            json!({ "items": [product] }),
        ] {
            let products = normalize_products(body.clone()).unwrap();
            assert_eq!(products.len(), 1, "shape {body}");
            assert_eq!(products[0].title, "Bike");
            assert_eq!(products[0].price_cents, Some(1500));
        }
    }

    #[test]
    fn unknown_list_shape_is_a_deserialization_error() {
        let err = normalize_products(json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn item_accepts_envelope_or_bare_object() {
        let wrapped: User = normalize_item(json!({
            "success": true,
            "message": "ok",
            "data": { "id": "u1", "role": "RIDER", "isBanned": true }
        }))
        .unwrap();
        assert!(wrapped.is_banned);

        let bare: User = normalize_item(json!({ "_id": "u2", "role": "VENDOR" })).unwrap();
        assert_eq!(bare.id, "u2");
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let user: User = serde_json::from_value(json!({
            "id": "u1", "role": "USER", "walletBalance": 42
        }))
        .unwrap();
        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["walletBalance"], json!(42));
        assert_eq!(back["isBanned"], json!(false));
    }

    #[test]
    fn role_filter_excludes_admins() {
        let users: Vec<User> = serde_json::from_value(json!([
            { "id": "1", "role": "RIDER" },
            { "id": "2", "role": "ADMIN" },
            { "id": "3", "role": "VENDOR" },
            { "id": "4", "role": "USER" }
        ]))
        .unwrap();

        let everyone = filter_users_by_role(users.clone(), &[]);
        assert_eq!(everyone.len(), 4);

        let roles = vec!["RIDER".to_owned(), "VENDOR".to_owned(), "ADMIN".to_owned()];
        let ids: Vec<_> = filter_users_by_role(users, &roles)
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn monthly_series_is_chronological() {
        let stats: MonthlyStats = serde_json::from_value(json!({
            "2024-03": 7, "2023-12": 2, "2024-01": 5, "later": 1
        }))
        .unwrap();
        let months: Vec<_> = stats.series().into_iter().map(|r| r.month).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-03", "later"]);
    }

    #[test]
    fn month_names_parse() {
        assert!(parse_month("March 2024").is_some());
        assert!(parse_month("Mar 2024").is_some());
        assert!(parse_month("2024-13").is_none());
    }

    #[test]
    fn rider_status_tolerates_unknown_values() {
        let rider: Rider = serde_json::from_value(json!({
            "id": "r1", "status": "ON_LEAVE", "_count": { "deliveries": 12 }
        }))
        .unwrap();
        assert_eq!(rider.status, Some(RiderStatus::Unknown));
        assert_eq!(rider.counts.unwrap().deliveries, 12);
    }

    #[test]
    fn category_form_validation() {
        assert!(CategoryForm::new("Shoes", "Footwear").validate_new().is_ok());
        let missing = CategoryForm {
            name: Some("Shoes".into()),
            ..CategoryForm::default()
        };
        assert!(matches!(
            missing.validate_new(),
            Err(Error::InvalidInput {
                field: "description",
                ..
            })
        ));
        assert!(CategoryForm::default().validate_edit().is_err());
    }

    #[test]
    fn kyc_decision_parses_case_insensitively() {
        assert_eq!("approved".parse::<KycDecision>().unwrap(), KycDecision::Approved);
        assert_eq!(KycDecision::Rejected.to_string(), "REJECTED");
        assert_eq!(serde_json::to_value(KycDecision::Approved).unwrap(), json!("APPROVED"));
    }

    #[test]
    fn image_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoe.PNG");
        std::fs::write(&path, b"png-bytes").unwrap();
        let image = CategoryImage::from_path(&path).unwrap();
        assert_eq!(image.file_name, "shoe.PNG");
        assert_eq!(image.mime.as_deref(), Some("image/png"));
        assert_eq!(image.bytes, b"png-bytes");
    }
}
