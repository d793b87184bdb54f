//! Estafeta coverage validation via the Worker proxy.
//!
//! The proxy fronts Estafeta's coverage check and answers with, among other
//! things, a free-text reexpedition cost field. The quote flow needs only a
//! boolean out of that text; [`requiere_reexpedicion`] owns that parse.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::CarrierError;

/// Coverage data returned by the proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidacionEstafeta {
    /// Free-text reexpedition cost: `"No"` when none applies, otherwise an
    /// amount such as `"$125.00"`.
    #[serde(default)]
    pub reexpe: String,
    pub success: bool,
    #[serde(default)]
    pub ocurre_forzoso: bool,
    #[serde(default)]
    pub estafeta_delivery_days: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ValidacionEstafeta {
    /// Whether the quoted route carries a reexpedition surcharge.
    #[must_use]
    pub fn requiere_reexpedicion(&self) -> bool {
        requiere_reexpedicion(&self.reexpe)
    }
}

/// Parses the free-text reexpedition cost field.
///
/// `"No"` (any casing) means no surcharge. Any other value is read as an
/// amount after stripping currency decoration; only a positive amount means
/// the surcharge applies. Empty or unparseable text counts as no surcharge.
#[must_use]
pub fn requiere_reexpedicion(texto: &str) -> bool {
    let limpio = texto.trim();
    if limpio.is_empty() || limpio.eq_ignore_ascii_case("no") {
        return false;
    }
    let numerico: String = limpio
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numerico.parse::<f64>().is_ok_and(|monto| monto > 0.0)
}

/// Client for the Estafeta validation proxy.
pub struct EstafetaProxy {
    client: Client,
    url: Url,
}

impl EstafetaProxy {
    /// Creates a proxy client pointed at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`CarrierError::Http`] if the HTTP client cannot be built, or
    /// [`CarrierError::Api`] for an invalid URL.
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, CarrierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(CarrierError::Http)?;
        let url = Url::parse(url)
            .map_err(|e| CarrierError::Api(format!("invalid proxy URL '{url}': {e}")))?;
        Ok(Self { client, url })
    }

    /// Checks coverage between two postal codes.
    ///
    /// The request is form-encoded, as the Worker proxy expects.
    ///
    /// # Errors
    ///
    /// [`CarrierError::Api`] when the proxy reports `success: false`;
    /// transport and shape failures otherwise.
    pub async fn validar(
        &self,
        origen: &str,
        destino: &str,
    ) -> Result<ValidacionEstafeta, CarrierError> {
        let formulario = [
            ("originZipCode", origen),
            ("destinationZipCode", destino),
            ("country", "MEX"),
            ("language", "0"),
        ];
        let response = self
            .client
            .post(self.url.clone())
            .form(&formulario)
            .send()
            .await
            .map_err(CarrierError::de_reqwest)?;
        let body = response.text().await.map_err(CarrierError::de_reqwest)?;
        let validacion: ValidacionEstafeta =
            serde_json::from_str(&body).map_err(|e| CarrierError::Deserialize {
                context: format!("estafeta({origen}->{destino})"),
                source: e,
            })?;
        if !validacion.success {
            return Err(CarrierError::Api(
                validacion
                    .error
                    .unwrap_or_else(|| "validación rechazada sin detalle".to_owned()),
            ));
        }
        Ok(validacion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_en_cualquier_caso_es_falso() {
        assert!(!requiere_reexpedicion("No"));
        assert!(!requiere_reexpedicion("NO"));
        assert!(!requiere_reexpedicion("no"));
    }

    #[test]
    fn monto_positivo_es_verdadero() {
        assert!(requiere_reexpedicion("$125.00"));
        assert!(requiere_reexpedicion("125"));
        assert!(requiere_reexpedicion(" $1,250.50 "));
    }

    #[test]
    fn vacio_o_ilegible_es_falso() {
        assert!(!requiere_reexpedicion(""));
        assert!(!requiere_reexpedicion("   "));
        assert!(!requiere_reexpedicion("consultar"));
    }

    #[test]
    fn cero_o_negativo_es_falso() {
        assert!(!requiere_reexpedicion("0"));
        assert!(!requiere_reexpedicion("$0.00"));
        assert!(!requiere_reexpedicion("-5"));
    }
}
