use serde_json::json;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{Ack, Product, normalize_item, normalize_products};

impl AdminClient {
    /// Every product awaiting or past moderation.
    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        let url = self.url(ApiArea::Admin, "")?;
        normalize_products(self.get(url, Auth::Required).await?)
    }

    pub async fn get_listing(&self, id: &str) -> Result<Product, Error> {
        let url = self.url(ApiArea::Listings, &with_id("listing", id)?)?;
        normalize_item(self.get(url, Auth::Required).await?)
    }

    pub async fn approve_listing(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, "approve")?;
        Self::ack(
            self.post(url, &json!({ "listingId": id }), Auth::Required)
                .await?,
        )
    }

    /// Reject a listing. The note is shown to the seller.
    pub async fn reject_listing(&self, id: &str, note: &str) -> Result<Ack, Error> {
        if note.trim().is_empty() {
            return Err(Error::invalid("note", "a rejection note is required"));
        }
        let url = self.url(ApiArea::Admin, "reject")?;
        let body = json!({ "listingId": id, "rejectionNote": note });
        Self::ack(self.post(url, &body, Auth::Required).await?)
    }

    pub async fn remove_listing(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, "remove")?;
        Self::ack(
            self.post(url, &json!({ "listingId": id }), Auth::Required)
                .await?,
        )
    }
}
