//! Entity CRUD: clientes, destinos and envíos.
//!
//! The three catalogs share one REST shape (list, search, advanced search,
//! get, create, update, delete, paginate), so the methods are generic over
//! the record type and take the [`Catalogo`] as a route selector.

use serde::de::DeserializeOwned;
use serde::Serialize;

use envios_core::{Destino, Envio};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{ModoBusqueda, Paginado};

/// Route selector for the CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalogo {
    Clientes,
    Destinos,
    Envios,
}

impl Catalogo {
    #[must_use]
    pub fn ruta(self) -> &'static str {
        match self {
            Catalogo::Clientes => "clientes",
            Catalogo::Destinos => "destinos",
            Catalogo::Envios => "envios",
        }
    }
}

/// Label file attached when a shipment was created with an external carrier.
#[derive(Debug, Clone)]
pub struct ArchivoEtiqueta {
    pub nombre: String,
    pub contenido: Vec<u8>,
}

impl ApiClient {
    /// Fetches one page of a catalog.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn paginar<T: DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        pagina: u32,
        por_pagina: u32,
    ) -> Result<Paginado<T>, ApiError> {
        let mut url = self.url(catalogo.ruta())?;
        url.query_pairs_mut()
            .append_pair("page", &pagina.to_string())
            .append_pair("per_page", &por_pagina.to_string());
        let body = self.enviar_json(self.http().get(url.clone()), &url).await?;
        Self::decodificar(body, catalogo.ruta())
    }

    /// Free-text search over a catalog.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn buscar<T: DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        consulta: &str,
        pagina: u32,
        por_pagina: u32,
    ) -> Result<Paginado<T>, ApiError> {
        let mut url = self.url(&format!("{}/search", catalogo.ruta()))?;
        url.query_pairs_mut()
            .append_pair("q", consulta)
            .append_pair("page", &pagina.to_string())
            .append_pair("per_page", &por_pagina.to_string());
        let body = self.enviar_json(self.http().get(url.clone()), &url).await?;
        Self::decodificar(body, catalogo.ruta())
    }

    /// Field-criteria search; `modo` selects whether every criterion must
    /// match or any one suffices.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn busqueda_avanzada<T: DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        criterios: &[(&str, &str)],
        modo: ModoBusqueda,
    ) -> Result<Paginado<T>, ApiError> {
        let url = self.url(&format!("{}/search", catalogo.ruta()))?;
        let criteria: serde_json::Map<String, serde_json::Value> = criterios
            .iter()
            .map(|(campo, valor)| ((*campo).to_owned(), serde_json::Value::from(*valor)))
            .collect();
        let cuerpo = serde_json::json!({
            "criteria": criteria,
            "match": modo.clave(),
        });
        let body = self
            .enviar_json(self.http().post(url.clone()).json(&cuerpo), &url)
            .await?;
        Self::decodificar(body, catalogo.ruta())
    }

    /// Fetches a single record by id.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn obtener<T: DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        id: i64,
    ) -> Result<T, ApiError> {
        let url = self.url(&format!("{}/{id}", catalogo.ruta()))?;
        let body = self.enviar_json(self.http().get(url.clone()), &url).await?;
        Self::decodificar(body, &format!("{}/{id}", catalogo.ruta()))
    }

    /// Creates a record and returns it with the server-assigned id.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn crear<T: Serialize + DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        registro: &T,
    ) -> Result<T, ApiError> {
        let url = self.url(catalogo.ruta())?;
        let body = self
            .enviar_json(self.http().post(url.clone()).json(registro), &url)
            .await?;
        Self::decodificar(body, catalogo.ruta())
    }

    /// Updates an existing record.
    ///
    /// # Errors
    ///
    /// [`ApiError::RateLimited`] on 429 — callers that tolerate throttling
    /// wrap this in [`crate::retry_with_backoff`] — plus the usual
    /// transport, status and shape failures.
    pub async fn actualizar<T: Serialize + DeserializeOwned>(
        &self,
        catalogo: Catalogo,
        id: i64,
        registro: &T,
    ) -> Result<T, ApiError> {
        let url = self.url(&format!("{}/{id}", catalogo.ruta()))?;
        let body = self
            .enviar_json(self.http().put(url.clone()).json(registro), &url)
            .await?;
        Self::decodificar(body, &format!("{}/{id}", catalogo.ruta()))
    }

    /// Hard-deletes a destino after verifying the operator typed the exact
    /// confirmation phrase (`eliminar <id>`).
    ///
    /// # Errors
    ///
    /// [`ApiError::FraseConfirmacionInvalida`] without touching the network
    /// when the phrase is wrong; otherwise the usual failures.
    pub async fn eliminar_destino(&self, id: i64, confirmacion: &str) -> Result<(), ApiError> {
        let esperada = Destino::frase_eliminacion(id);
        if confirmacion.trim() != esperada {
            return Err(ApiError::FraseConfirmacionInvalida { esperada });
        }
        let url = self.url(&format!("destinos/{id}"))?;
        let cuerpo = serde_json::json!({ "confirmacion": esperada });
        self.enviar_descartando(self.http().delete(url.clone()).json(&cuerpo), &url)
            .await
    }

    /// Creates the shipment record, attaching the label file as multipart
    /// data when the external option was chosen.
    ///
    /// # Errors
    ///
    /// Transport, status and shape failures as [`ApiError`].
    pub async fn crear_envio(
        &self,
        envio: &Envio,
        etiqueta: Option<&ArchivoEtiqueta>,
    ) -> Result<Envio, ApiError> {
        let Some(archivo) = etiqueta else {
            return self.crear(Catalogo::Envios, envio).await;
        };

        let url = self.url(Catalogo::Envios.ruta())?;
        let envio_json = serde_json::to_string(envio).map_err(|e| ApiError::Deserialize {
            context: "envios(serialize)".to_owned(),
            source: e,
        })?;
        let form = reqwest::multipart::Form::new()
            .text("envio", envio_json)
            .part(
                "etiqueta",
                reqwest::multipart::Part::bytes(archivo.contenido.clone())
                    .file_name(archivo.nombre.clone()),
            );
        let body = self
            .enviar_json(self.http().post(url.clone()).multipart(form), &url)
            .await?;
        Self::decodificar(body, "envios(multipart)")
    }

    /// Tells the backend which shipping method a quotation session ended up
    /// using. Callers treat this as best-effort.
    ///
    /// # Errors
    ///
    /// Transport and status failures as [`ApiError`].
    pub async fn notificar_metodo_cotizacion(
        &self,
        cotizacion_id: &str,
        metodo: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("cotizaciones/{cotizacion_id}/metodo"))?;
        let cuerpo = serde_json::json!({ "metodo": metodo });
        self.enviar_descartando(self.http().post(url.clone()).json(&cuerpo), &url)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frase_incorrecta_falla_sin_red() {
        let client = ApiClient::with_base_url("http://0.0.0.0:1", 30).unwrap();
        let err = client.eliminar_destino(42, "borrar 42").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::FraseConfirmacionInvalida { ref esperada } if esperada == "eliminar 42"
        ));
    }
}
