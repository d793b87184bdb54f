//! Clients for the external carrier collaborators: the Estafeta
//! validation Worker proxy and the Manuable rate/label aggregator.

pub mod error;
pub mod estafeta;
pub mod manuable;

pub use error::CarrierError;
pub use estafeta::{requiere_reexpedicion, EstafetaProxy, ValidacionEstafeta};
pub use manuable::{EtiquetaManuable, ManuableClient, SolicitudTarifas, TarifaManuable};
