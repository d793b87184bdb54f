//! Domain types and shared logic for the Centro de Envíos console.

pub mod app_config;
pub mod clientes;
pub mod config;
pub mod costos;
pub mod cotizacion;
pub mod destinos;
pub mod envios;
pub mod peso;
pub mod tracker;

pub use app_config::{AppConfig, Environment, PoliticaDriftCp};
pub use clientes::{Cliente, Direccion};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use costos::{desglose_envio, ComponentesCosto, Descuento, DesgloseEnvio};
pub use cotizacion::{CargosAdicionales, OpcionEmpaque, ServicioCotizado, TipoPaquete};
pub use destinos::Destino;
pub use envios::{Envio, EstatusEnvio, MetodoCreacion};
pub use tracker::{ChangeTracker, Persistible};
