use reqwest::Method;

use crate::client::{AdminClient, ApiArea, Auth};
use crate::endpoints::with_id;
use crate::error::Error;
use crate::models::{Ack, Category, CategoryForm, normalize_list};

impl AdminClient {
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        let url = self.url(ApiArea::Admin, "get-category")?;
        normalize_list(self.get(url, Auth::Required).await?)
    }

    /// Create a category from a multipart form (`name`, `description`,
    /// optional `image`).
    pub async fn add_category(&self, form: CategoryForm) -> Result<Ack, Error> {
        form.validate_new()?;
        let url = self.url(ApiArea::Admin, "add-category")?;
        let value = self
            .send_multipart(Method::POST, url, form.into_multipart()?)
            .await?;
        Self::ack(value)
    }

    pub async fn edit_category(&self, id: &str, form: CategoryForm) -> Result<Ack, Error> {
        form.validate_edit()?;
        let url = self.url(ApiArea::Admin, &with_id("edit-category", id)?)?;
        let value = self
            .send_multipart(Method::PUT, url, form.into_multipart()?)
            .await?;
        Self::ack(value)
    }

    /// Delete a category. A category that still has listings is refused
    /// with [`Error::Conflict`].
    pub async fn delete_category(&self, id: &str) -> Result<Ack, Error> {
        let url = self.url(ApiArea::Admin, &with_id("delete-category", id)?)?;
        Self::ack(self.delete(url).await?)
    }
}
