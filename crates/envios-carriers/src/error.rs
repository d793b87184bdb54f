use thiserror::Error;

/// Errors returned by the carrier clients.
#[derive(Debug, Error)]
pub enum CarrierError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request exceeded its configured deadline.
    #[error("request timed out: {url}")]
    TimedOut { url: String },

    /// The carrier answered but flagged failure in the payload.
    #[error("carrier error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CarrierError {
    pub(crate) fn de_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map_or_else(|| "<unknown>".to_owned(), ToString::to_string);
            return CarrierError::TimedOut { url };
        }
        CarrierError::Http(err)
    }
}
