use serde_json::Value;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{
    MonthlyStats, RideStats, Rider, RiderList, normalize_item, normalize_list,
};

impl AdminClient {
    /// Every rider. The server answers `{ data: { riders, total } }`;
    /// a plain list is accepted too.
    pub async fn list_riders(&self) -> Result<RiderList, Error> {
        let url = self.url(ApiArea::Rider, "riders")?;
        let value = self.get(url, Auth::Required).await?;
        rider_list(value)
    }

    pub async fn get_rider(&self, id: &str) -> Result<Rider, Error> {
        let url = self.url(ApiArea::Rider, &with_id("single-rider", id)?)?;
        normalize_item(self.get(url, Auth::Required).await?)
    }

    pub async fn rider_stats(&self) -> Result<RideStats, Error> {
        let url = self.url(ApiArea::Rider, "rider-stats")?;
        normalize_item(self.get(url, Auth::Required).await?)
    }

    pub async fn rider_monthly_stats(&self) -> Result<MonthlyStats, Error> {
        let url = self.url(ApiArea::Rider, "rider-analytics/monthly")?;
        normalize_item(self.get(url, Auth::Required).await?)
    }
}

fn rider_list(value: Value) -> Result<RiderList, Error> {
    let wrapped = value
        .get("data")
        .is_some_and(|d| d.get("riders").is_some())
        || value.get("riders").is_some();
    if wrapped {
        return normalize_item(value);
    }
    let riders: Vec<Rider> = normalize_list(value)?;
    let total = u64::try_from(riders.len()).unwrap_or(u64::MAX);
    Ok(RiderList { riders, total })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rider_list_shapes() {
        let wrapped = rider_list(json!({
            "success": true,
            "data": { "riders": [{ "id": "r1" }], "total": 9 }
        }))
        .unwrap();
        assert_eq!(wrapped.total, 9);

        let bare = rider_list(json!([{ "id": "r1" }, { "id": "r2" }])).unwrap();
        assert_eq!(bare.total, 2);
        assert_eq!(bare.riders[1].id, "r2");
    }
}
