use serde_json::json;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{Ack, User, normalize_item, normalize_list};

impl AdminClient {
    /// All user accounts, unfiltered.
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        let url = self.url(ApiArea::Admin, "users")?;
        normalize_list(self.get(url, Auth::Required).await?)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, Error> {
        let url = self.url(ApiArea::Admin, &with_id("single-user", id)?)?;
        normalize_item(self.get(url, Auth::Required).await?)
    }

    pub async fn update_user_role(&self, id: &str, role: &str) -> Result<Ack, Error> {
        if role.trim().is_empty() {
            return Err(Error::invalid("role", "a role is required"));
        }
        let url = self.url(ApiArea::Admin, "role")?;
        let body = json!({ "role": role, "userId": id });
        Self::ack(self.post(url, &body, Auth::Required).await?)
    }

    pub async fn ban_user(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, &with_id("ban", id)?)?;
        Self::ack(self.post(url, &json!({}), Auth::Required).await?)
    }

    pub async fn unban_user(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, &with_id("unban", id)?)?;
        Self::ack(self.post(url, &json!({}), Auth::Required).await?)
    }
}
