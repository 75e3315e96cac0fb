use serde_json::json;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::error::Error;
use crate::models::{Ack, KycDecision, KycRequest, normalize_list};

impl AdminClient {
    pub async fn kyc_requests(&self) -> Result<Vec<KycRequest>, Error> {
        let url = self.url(ApiArea::Admin, "kyc")?;
        normalize_list(self.get(url, Auth::Required).await?)
    }

    pub async fn update_kyc_status(&self, id: &str, decision: KycDecision) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, "kyc/status")?;
        let body = json!({ "status": decision, "kycId": id });
        Self::ack(self.post(url, &body, Auth::Required).await?)
    }
}
