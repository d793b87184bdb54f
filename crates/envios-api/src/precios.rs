//! Pricing endpoint (`get-prices.php`).
//!
//! The request mirrors the quote form; the server is authoritative for the
//! billable weight and for the domestic zone when origin/destination codes
//! are submitted instead of an explicit zone.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use envios_core::{CargosAdicionales, ServicioCotizado};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Pricing request. `zona` is set for international quotes (1–5); domestic
/// quotes submit the origin/destination codes and let the server derive the
/// zone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudCotizacion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zona: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_postal_origen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_postal_destino: Option<String>,
    pub tipo_paquete: String,
    pub peso: f64,
    pub peso_volumetrico: f64,
    pub es_internacional: bool,
    pub valor_seguro: Decimal,
    pub opcion_empaque: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_empaque_personalizado: Option<Decimal>,
    pub requiere_recoleccion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_recoleccion: Option<Decimal>,
    pub requiere_reexpedicion: bool,
}

/// Pricing response: candidate services plus the charge block and the
/// server-resolved weights.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespuestaCotizacion {
    pub exito: bool,
    #[serde(default)]
    pub servicios: Vec<ServicioCotizado>,
    #[serde(default)]
    pub cargos_adicionales: CargosAdicionales,
    /// IVA rate, e.g. `0.16`. Absent on older backends; callers fall back
    /// to the 16% default.
    #[serde(default)]
    pub iva: Option<Decimal>,
    #[serde(default)]
    pub peso_total: f64,
    #[serde(default)]
    pub peso_volumetrico: f64,
    #[serde(default)]
    pub peso_facturable: f64,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiClient {
    /// Requests per-service prices for a quote.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Api`] with the server's message verbatim when the
    ///   payload reports `exito: false`. Never retried.
    /// - Transport and shape failures as elsewhere.
    pub async fn cotizar(
        &self,
        solicitud: &SolicitudCotizacion,
    ) -> Result<RespuestaCotizacion, ApiError> {
        let url = self.url("get-prices.php")?;
        let body = self
            .enviar_json(self.http().post(url.clone()).json(solicitud), &url)
            .await?;
        let respuesta: RespuestaCotizacion = Self::decodificar(body, "get-prices")?;
        if !respuesta.exito {
            return Err(ApiError::Api(
                respuesta
                    .error
                    .unwrap_or_else(|| "cotización rechazada sin detalle".to_owned()),
            ));
        }
        Ok(respuesta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solicitud_domestica_omite_zona() {
        let solicitud = SolicitudCotizacion {
            zona: None,
            codigo_postal_origen: Some("06600".to_owned()),
            codigo_postal_destino: Some("44160".to_owned()),
            tipo_paquete: "Paquete".to_owned(),
            peso: 2.0,
            peso_volumetrico: 1.5,
            es_internacional: false,
            valor_seguro: Decimal::ZERO,
            opcion_empaque: "EMP00".to_owned(),
            precio_empaque_personalizado: None,
            requiere_recoleccion: false,
            precio_recoleccion: None,
            requiere_reexpedicion: false,
        };
        let v = serde_json::to_value(&solicitud).unwrap();
        assert!(v.get("zona").is_none());
        assert_eq!(v["codigoPostalOrigen"], "06600");
        assert_eq!(v["tipoPaquete"], "Paquete");
        assert_eq!(v["pesoVolumetrico"], 1.5);
    }
}
