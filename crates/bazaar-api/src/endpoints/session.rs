use serde::Deserialize;
use tracing::info;

use crate::auth::{AdminProfile, AdminSession, LoginRequest};
use crate::client::{AdminClient, ApiArea, Auth};
use crate::error::Error;
use crate::models::normalize_envelope;

#[derive(Deserialize)]
struct LoginData {
    token: String,
    admin: AdminProfile,
}

impl AdminClient {
    /// Validate the form, exchange credentials for a token and install
    /// the resulting session in this client's [`AuthContext`](crate::AuthContext).
    ///
    /// Any server-side refusal is reported as [`Error::Authentication`].
    pub async fn login(&self, request: &LoginRequest) -> Result<AdminSession, Error> {
        request.validate()?;

        let url = self.url(ApiArea::Admin, "login")?;
        let value = self
            .post(url, &request.to_body(), Auth::Optional)
            .await
            .map_err(|e| match e {
                Error::SessionExpired { message, .. } | Error::Rejected { message, .. } => {
                    Error::Authentication { message }
                }
                other => other,
            })?;

        let data: LoginData = normalize_envelope(value)?;
        if data.token.is_empty() {
            return Err(Error::Authentication {
                message: "login response carried no token".into(),
            });
        }

        let session = AdminSession::new(data.token, data.admin);
        self.auth().initialize(session.clone());
        info!(email = %session.admin.email, "signed in");
        Ok(session)
    }

    /// Forget the current session locally. The API has no logout call.
    pub fn logout(&self) {
        self.auth().clear();
        info!("signed out");
    }
}
