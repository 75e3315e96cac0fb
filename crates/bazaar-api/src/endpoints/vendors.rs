use serde_json::json;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{Ack, Vendor, VendorApplication, normalize_item, normalize_list};

impl AdminClient {
    pub async fn vendor_applications(&self) -> Result<Vec<VendorApplication>, Error> {
        let url = self.url(ApiArea::Vendor, "applications")?;
        normalize_list(self.get(url, Auth::Required).await?)
    }

    pub async fn get_vendor(&self, id: &str) -> Result<Vendor, Error> {
        let url = self.url(ApiArea::Vendor, &with_id("get-vendor", id)?)?;
        normalize_item(self.get(url, Auth::Required).await?)
    }

    pub async fn approve_vendor(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Vendor, &with_id("approve", id)?)?;
        Self::ack(self.patch(url, &json!({})).await?)
    }

    pub async fn reject_vendor(&self, id: &str, note: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Vendor, &with_id("reject", id)?)?;
        Self::ack(self.patch(url, &json!({ "note": note })).await?)
    }
}
