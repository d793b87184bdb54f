//! Typed HTTP client for the Centro de Envíos backend.
//!
//! One [`ApiClient`] covers every collaborator endpoint the console consumes:
//! postal lookup, delivery frequency, pricing, authentication and the
//! cliente/destino/envío CRUD surface. All failures are typed
//! [`ApiError`]s; nothing here panics on a bad response.

pub mod auth;
pub mod client;
pub mod error;
pub mod precios;
pub mod registros;
pub mod retry;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use precios::{RespuestaCotizacion, SolicitudCotizacion};
pub use registros::{ArchivoEtiqueta, Catalogo};
pub use retry::retry_with_backoff;
pub use types::{DireccionCp, FrecuenciaEntrega, ModoBusqueda, Paginado, SesionIniciada};
