use thiserror::Error;

use envios_api::ApiError;
use envios_carriers::CarrierError;
use envios_core::clientes::ValidacionError;

/// Errors surfaced by the wizard and its submission sequence.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A guard refused a forward transition; the message names the missing
    /// requirement.
    #[error("transición no permitida: {0}")]
    TransicionInvalida(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    Validacion(#[from] ValidacionError),

    /// The blocking variant of the zip-drift policy fired.
    #[error("los códigos postales difieren de los cotizados: {detalle}")]
    DriftCodigoPostal { detalle: String },

    /// Shipment creation failed after earlier steps already persisted
    /// records. There is no automatic rollback; the ids are carried so the
    /// operator can clean up.
    #[error(
        "no se pudo crear el envío (cliente_id={cliente_id:?}, destino_id={destino_id:?}): {source}"
    )]
    EnvioFallido {
        cliente_id: Option<i64>,
        destino_id: Option<i64>,
        #[source]
        source: ApiError,
    },

    /// Session cache I/O failure.
    #[error("session cache I/O: {0}")]
    Io(#[from] std::io::Error),
}
