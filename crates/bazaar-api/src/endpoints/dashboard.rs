use crate::client::{AdminClient, ApiArea, Auth};
use crate::error::Error;
use crate::models::{DashboardStats, normalize_item};

impl AdminClient {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, Error> {
        let url = self.url(ApiArea::Admin, "dashboard")?;
        normalize_item(self.get(url, Auth::Required).await?)
    }
}
