//! The quote-to-shipment wizard.
//!
//! Composes the quote engine, the customer/destination change trackers, the
//! third-party-option selector and the submission sequence behind one
//! explicit state machine. The session store lives here too: it is the
//! single source of truth for the locally cached auth session and for the
//! transient quotation-session marker that bridges quoting and shipment
//! creation.

pub mod controller;
pub mod cotizador;
pub mod envio;
pub mod error;
pub mod sesion;

pub use controller::{OpcionTerceros, Paso, SubPaso, WizardController};
pub use cotizador::{Cotizador, ParametrosPaquete, ResultadoCotizacion, RutaCotizacion};
pub use envio::{buscar_codigos, EnvioSubmitter, ResultadoEnvio};
pub use error::WizardError;
pub use sesion::{vigilar, SesionLocal, SessionStore};
