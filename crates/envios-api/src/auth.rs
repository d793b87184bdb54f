//! Authentication endpoints.

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::SesionIniciada;

#[derive(Serialize)]
struct CredencialesLogin<'a> {
    credential: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Exchanges credentials for a token and user profile.
    ///
    /// The returned token is **not** installed on the client automatically;
    /// call [`ApiClient::set_token`] once the caller has persisted it.
    ///
    /// # Errors
    ///
    /// - [`ApiError::UnexpectedStatus`] on rejected credentials (401/403).
    /// - [`ApiError::Http`] / [`ApiError::TimedOut`] /
    ///   [`ApiError::Deserialize`] on transport or shape failures.
    pub async fn login(
        &self,
        credential: &str,
        password: &str,
    ) -> Result<SesionIniciada, ApiError> {
        let url = self.url("login.php")?;
        let cuerpo = CredencialesLogin {
            credential,
            password,
        };
        let body = self
            .enviar_json(self.http().post(url.clone()).json(&cuerpo), &url)
            .await?;
        Self::decodificar(body, "login")
    }

    /// Ends the server-side session. The caller is responsible for clearing
    /// the local cache afterwards regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Transport failures and unexpected statuses.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = self.url("logout.php")?;
        self.enviar_descartando(self.http().post(url.clone()), &url)
            .await
    }
}
