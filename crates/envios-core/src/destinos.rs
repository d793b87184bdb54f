//! Destination (recipient) records.
//!
//! A destino is always owned by exactly one customer; in every flow it is
//! created only after a customer exists or has been selected. Unlike
//! customers, destinos are hard-deletable, guarded by a typed confirmation
//! phrase.

use serde::{Deserialize, Serialize};

use crate::clientes::{Direccion, ValidacionError};
use crate::tracker::Persistible;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destino {
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning customer. `None` only while the owner itself is unsaved; the
    /// submitter fills it in before the destino is persisted.
    #[serde(default)]
    pub cliente_id: Option<i64>,
    pub nombre: String,
    pub telefono: String,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(flatten)]
    pub direccion: Direccion,
}

impl Persistible for Destino {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Destino {
    /// Validates the destination form.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidacionError`] encountered.
    pub fn validar(&self) -> Result<(), ValidacionError> {
        if self.nombre.trim().is_empty() {
            return Err(ValidacionError::CampoRequerido("nombre"));
        }
        if self.telefono.trim().is_empty() {
            return Err(ValidacionError::CampoRequerido("telefono"));
        }
        self.direccion.validar()
    }

    /// The exact phrase an operator must type to confirm deletion of the
    /// destino with the given id.
    #[must_use]
    pub fn frase_eliminacion(id: i64) -> String {
        format!("eliminar {id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frase_eliminacion_incluye_el_id() {
        assert_eq!(Destino::frase_eliminacion(42), "eliminar 42");
    }
}
