//! Manuable, the multi-carrier rate/label aggregator used as the alternate
//! shipment-creation path.

use std::time::Duration;

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CarrierError;

/// Package data submitted when asking Manuable for rates.
#[derive(Debug, Clone, Serialize)]
pub struct SolicitudTarifas {
    pub codigo_postal_origen: String,
    pub codigo_postal_destino: String,
    pub peso: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancho: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alto: Option<f64>,
}

/// One rate offered by the aggregator. The `uuid` is what the shipment
/// record stores when this path is chosen.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TarifaManuable {
    pub uuid: Uuid,
    pub servicio: String,
    pub paqueteria: String,
    pub total: Decimal,
    #[serde(default)]
    pub dias_entrega: Option<u32>,
}

/// A purchased label.
#[derive(Debug, Clone, Deserialize)]
pub struct EtiquetaManuable {
    pub tracking_number: String,
    pub url_etiqueta: String,
}

#[derive(Deserialize)]
struct Envuelto<T> {
    data: T,
}

/// Client for the Manuable REST API.
pub struct ManuableClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ManuableClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CarrierError::Http`] if the HTTP client cannot be built, or
    /// [`CarrierError::Api`] for an invalid URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CarrierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(CarrierError::Http)?;
        let normalizada = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalizada)
            .map_err(|e| CarrierError::Api(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Installs the aggregator session token.
    #[must_use]
    pub fn con_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    fn url(&self, path: &str) -> Result<Url, CarrierError> {
        self.base_url
            .join(path)
            .map_err(|e| CarrierError::Api(format!("invalid request path '{path}': {e}")))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        cuerpo: &impl Serialize,
    ) -> Result<T, CarrierError> {
        let url = self.url(path)?;
        let mut req = self.client.post(url.clone()).json(cuerpo);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await.map_err(CarrierError::de_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(CarrierError::de_reqwest)?;
        if !status.is_success() {
            return Err(CarrierError::Api(format!(
                "manuable respondió {status} en {path}: {body}"
            )));
        }
        serde_json::from_str(&body).map_err(|e| CarrierError::Deserialize {
            context: format!("manuable({path})"),
            source: e,
        })
    }

    /// Fetches the candidate rates for a package between two postal codes.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`CarrierError`].
    pub async fn obtener_tarifas(
        &self,
        solicitud: &SolicitudTarifas,
    ) -> Result<Vec<TarifaManuable>, CarrierError> {
        let envuelto: Envuelto<Vec<TarifaManuable>> = self.post_json("rates", solicitud).await?;
        Ok(envuelto.data)
    }

    /// Buys the label for a previously returned rate.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`CarrierError`].
    pub async fn crear_etiqueta(&self, rate_uuid: Uuid) -> Result<EtiquetaManuable, CarrierError> {
        let cuerpo = serde_json::json!({ "rate_uuid": rate_uuid });
        let envuelto: Envuelto<EtiquetaManuable> = self.post_json("labels", &cuerpo).await?;
        Ok(envuelto.data)
    }
}
