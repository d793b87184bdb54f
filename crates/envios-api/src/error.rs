use thiserror::Error;

/// Errors returned by the backend API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request exceeded its configured deadline. Kept distinct from
    /// [`ApiError::Http`] so callers can tell a hang from a refusal.
    #[error("request timed out: {url}")]
    TimedOut { url: String },

    /// HTTP 429. The only status the client ever retries.
    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The backend answered 2xx but flagged failure in the payload
    /// (`exito: false` or an `error` field). The message is surfaced
    /// verbatim and never retried.
    #[error("{0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Postal code failed local validation (fewer than 5 digits); no
    /// request was made.
    #[error("código postal inválido: {0:?}")]
    CodigoPostalInvalido(String),

    /// The lookup succeeded but the code is unknown to the catalog.
    #[error("código postal no encontrado: {0}")]
    CodigoPostalNoEncontrado(String),

    /// Destination deletion attempted without the exact typed phrase.
    #[error("frase de confirmación incorrecta, se esperaba {esperada:?}")]
    FraseConfirmacionInvalida { esperada: String },
}

impl ApiError {
    /// Classifies a `reqwest` failure, splitting timeouts out of the
    /// generic HTTP bucket.
    pub(crate) fn de_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map_or_else(|| "<unknown>".to_owned(), ToString::to_string);
            return ApiError::TimedOut { url };
        }
        ApiError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn los_errores_de_conexion_no_son_timeout() {
        let err = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(ApiError::de_reqwest(err), ApiError::Http(_)));
    }
}
