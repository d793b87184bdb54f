//! HTTP client for the Centro de Envíos backend.
//!
//! Wraps `reqwest` with backend-specific error handling, bearer-token
//! management and typed response deserialization. Every request carries a
//! connect timeout and an overall deadline; a deadline miss surfaces as
//! [`ApiError::TimedOut`], never as a hung future.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use envios_core::clientes::codigo_postal_valido;
use envios_core::AppConfig;

use crate::error::ApiError;
use crate::types::{DireccionCp, FrecuenciaEntrega, RespuestaZipCodes};

const DEFAULT_USER_AGENT: &str = "envios/0.1 (centro-envios)";

/// Client for the brokerage backend API.
///
/// Use [`ApiClient::new`] with the loaded [`AppConfig`] for production or
/// [`ApiClient::with_base_url`] to point at a mock server in tests.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApiError::Api`] for an invalid base URL.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        Self::build(
            &config.api_base_url,
            config.request_timeout_secs,
            config.connect_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ApiClient::new`].
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        Self::build(base_url, timeout_secs, 10, DEFAULT_USER_AGENT)
    }

    fn build(
        base_url: &str,
        timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(ApiError::Http)?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // join() appends path segments instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ApiError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Installs the bearer token attached to every subsequent request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Builder-style variant of [`ApiClient::set_token`].
    #[must_use]
    pub fn con_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Api(format!("invalid request path '{path}': {e}")))
    }

    fn autorizado(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends a prepared request, classifies the status, and parses the body
    /// as JSON.
    pub(crate) async fn enviar_json(
        &self,
        req: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<serde_json::Value, ApiError> {
        let body = self.enviar_texto(req, url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Sends a prepared request and discards the body, keeping only the
    /// status classification. For endpoints whose response is an echo.
    pub(crate) async fn enviar_descartando(
        &self,
        req: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<(), ApiError> {
        self.enviar_texto(req, url).await.map(|_| ())
    }

    async fn enviar_texto(
        &self,
        req: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<String, ApiError> {
        let response = self
            .autorizado(req)
            .send()
            .await
            .map_err(ApiError::de_reqwest)?;
        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            return Err(ApiError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().await.map_err(ApiError::de_reqwest)
    }

    pub(crate) fn decodificar<T: DeserializeOwned>(
        body: serde_json::Value,
        context: &str,
    ) -> Result<T, ApiError> {
        serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Resolves a 5-digit postal code to its state, municipality, city and
    /// candidate colonia list.
    ///
    /// Fails locally (no request issued) when `cp` is not 5 ASCII digits.
    /// On any failure the caller must clear previously derived address
    /// fields so stale autofill does not survive an invalid lookup.
    ///
    /// # Errors
    ///
    /// - [`ApiError::CodigoPostalInvalido`] for a malformed code.
    /// - [`ApiError::CodigoPostalNoEncontrado`] when the catalog has no rows.
    /// - [`ApiError::Http`] / [`ApiError::TimedOut`] /
    ///   [`ApiError::Deserialize`] on transport or shape failures.
    pub async fn buscar_codigo_postal(&self, cp: &str) -> Result<DireccionCp, ApiError> {
        if !codigo_postal_valido(cp) {
            return Err(ApiError::CodigoPostalInvalido(cp.to_owned()));
        }
        let mut url = self.url("zip_codes.php")?;
        url.query_pairs_mut().append_pair("zip_code", cp);

        let body = self.enviar_json(self.client.get(url.clone()), &url).await?;
        let respuesta: RespuestaZipCodes =
            Self::decodificar(body, &format!("zip_codes(cp={cp})"))?;

        let Some(primera) = respuesta.zip_codes.first() else {
            return Err(ApiError::CodigoPostalNoEncontrado(cp.to_owned()));
        };
        Ok(DireccionCp {
            estado: primera.d_estado.clone(),
            municipio: primera.d_mnpio.clone(),
            ciudad: primera.d_ciudad.clone(),
            colonias: respuesta
                .zip_codes
                .into_iter()
                .map(|e| e.d_asenta)
                .collect(),
        })
    }

    /// Fetches the delivery-frequency policy for a postal code: weekday
    /// coverage, extended-zone and ocurre-forzoso flags.
    ///
    /// # Errors
    ///
    /// [`ApiError::Api`] when the payload carries an `error` field;
    /// transport and shape failures as in [`ApiClient::buscar_codigo_postal`].
    pub async fn frecuencia_entrega(&self, cp: &str) -> Result<FrecuenciaEntrega, ApiError> {
        let mut url = self.url("delivery-frequency.php")?;
        url.query_pairs_mut().append_pair("postal_code", cp);

        let body = self.enviar_json(self.client.get(url.clone()), &url).await?;
        let frecuencia: FrecuenciaEntrega =
            Self::decodificar(body, &format!("delivery-frequency(cp={cp})"))?;
        if let Some(error) = &frecuencia.error {
            if !error.is_empty() {
                return Err(ApiError::Api(error.clone()));
            }
        }
        Ok(frecuencia)
    }

    /// Reports stale carrier data upstream. The response body is an echo and
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Transport failures only; callers treat this endpoint as best-effort.
    pub async fn reportar_desactualizado(
        &self,
        origin_zip: &str,
        dest_zip: &str,
        estafeta_data: &serde_json::Value,
    ) -> Result<(), ApiError> {
        let url = self.url("report-outdated")?;
        let cuerpo = serde_json::json!({
            "originZip": origin_zip,
            "destZip": dest_zip,
            "estafetaData": estafeta_data,
        });
        self.enviar_descartando(self.client.post(url.clone()).json(&cuerpo), &url)
            .await
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}
