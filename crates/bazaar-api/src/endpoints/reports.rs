use serde_json::json;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{Ack, Report, normalize_list};

impl AdminClient {
    pub async fn reports(&self) -> Result<Vec<Report>, Error> {
        let url = self.url(ApiArea::Admin, "reports")?;
        normalize_list(self.get(url, Auth::Required).await?)
    }

    pub async fn resolve_report(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, &with_id("resolve-report", id)?)?;
        Self::ack(self.post(url, &json!({}), Auth::Required).await?)
    }
}
