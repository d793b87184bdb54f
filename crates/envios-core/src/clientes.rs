//! Customer records and the shared postal address block.
//!
//! Field names follow the backend wire contract verbatim (`codigo_postal`,
//! `numero_ext`, …). The candidate-colonia list returned by the postal lookup
//! is transient UI state and is deliberately **not** part of these records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracker::Persistible;

/// Postal address block shared by [`Cliente`] and [`crate::Destino`].
///
/// `estado`, `municipio` and `ciudad` are auto-populated from the postal
/// lookup; the change tracker excludes them when deciding whether a record
/// has genuine user edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direccion {
    #[serde(default)]
    pub calle: String,
    #[serde(default)]
    pub numero_ext: String,
    #[serde(default)]
    pub numero_int: Option<String>,
    pub codigo_postal: String,
    #[serde(default)]
    pub colonia: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub referencia: Option<String>,
}

/// A customer of the brokerage. Soft-deactivated via `activo`; customers are
/// never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cliente {
    #[serde(default)]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub razon_social: Option<String>,
    #[serde(default)]
    pub rfc: Option<String>,
    pub telefono: String,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(flatten)]
    pub direccion: Direccion,
    #[serde(default = "activo_default")]
    pub activo: bool,
}

fn activo_default() -> bool {
    true
}

impl Persistible for Cliente {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Field-level validation failures, surfaced before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidacionError {
    #[error("campo requerido: {0}")]
    CampoRequerido(&'static str),

    #[error("código postal inválido: {0:?} (se requieren 5 dígitos)")]
    CodigoPostalInvalido(String),

    #[error("correo inválido: {0:?}")]
    CorreoInvalido(String),
}

/// Returns `true` when `cp` is exactly five ASCII digits.
#[must_use]
pub fn codigo_postal_valido(cp: &str) -> bool {
    cp.len() == 5 && cp.bytes().all(|b| b.is_ascii_digit())
}

impl Direccion {
    /// Validates the address fields that gate form progression.
    ///
    /// # Errors
    ///
    /// Returns [`ValidacionError`] for a missing street or a malformed
    /// postal code.
    pub fn validar(&self) -> Result<(), ValidacionError> {
        if self.calle.trim().is_empty() {
            return Err(ValidacionError::CampoRequerido("calle"));
        }
        if !codigo_postal_valido(&self.codigo_postal) {
            return Err(ValidacionError::CodigoPostalInvalido(
                self.codigo_postal.clone(),
            ));
        }
        Ok(())
    }

    /// Clears the lookup-derived fields after a failed postal lookup so no
    /// stale auto-filled data survives an invalid code.
    pub fn limpiar_derivados(&mut self) {
        self.estado.clear();
        self.municipio.clear();
        self.ciudad.clear();
        self.colonia.clear();
    }
}

impl Cliente {
    /// Validates the customer form.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidacionError`] encountered: missing
    /// nombre/telefono, an invalid address, or a malformed correo.
    pub fn validar(&self) -> Result<(), ValidacionError> {
        if self.nombre.trim().is_empty() {
            return Err(ValidacionError::CampoRequerido("nombre"));
        }
        if self.telefono.trim().is_empty() {
            return Err(ValidacionError::CampoRequerido("telefono"));
        }
        self.direccion.validar()?;
        if let Some(correo) = &self.correo {
            if !correo.is_empty() && !correo.contains('@') {
                return Err(ValidacionError::CorreoInvalido(correo.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cliente_valido() -> Cliente {
        Cliente {
            id: None,
            nombre: "Laura Méndez".to_owned(),
            razon_social: None,
            rfc: None,
            telefono: "5512345678".to_owned(),
            correo: Some("laura@example.com".to_owned()),
            direccion: Direccion {
                calle: "Av. Reforma".to_owned(),
                numero_ext: "100".to_owned(),
                codigo_postal: "06600".to_owned(),
                colonia: "Juárez".to_owned(),
                estado: "Ciudad de México".to_owned(),
                municipio: "Cuauhtémoc".to_owned(),
                ciudad: "Ciudad de México".to_owned(),
                ..Direccion::default()
            },
            activo: true,
        }
    }

    #[test]
    fn cliente_valido_pasa_validacion() {
        assert!(cliente_valido().validar().is_ok());
    }

    #[test]
    fn codigo_postal_corto_es_invalido() {
        assert!(!codigo_postal_valido("660"));
        assert!(!codigo_postal_valido("066000"));
        assert!(!codigo_postal_valido("0660a"));
        assert!(codigo_postal_valido("06600"));
    }

    #[test]
    fn nombre_vacio_falla() {
        let mut c = cliente_valido();
        c.nombre = "  ".to_owned();
        assert_eq!(
            c.validar(),
            Err(ValidacionError::CampoRequerido("nombre"))
        );
    }

    #[test]
    fn correo_sin_arroba_falla() {
        let mut c = cliente_valido();
        c.correo = Some("laura.example.com".to_owned());
        assert!(matches!(
            c.validar(),
            Err(ValidacionError::CorreoInvalido(_))
        ));
    }

    #[test]
    fn limpiar_derivados_borra_campos_de_consulta() {
        let mut d = cliente_valido().direccion;
        d.limpiar_derivados();
        assert!(d.estado.is_empty());
        assert!(d.municipio.is_empty());
        assert!(d.ciudad.is_empty());
        assert!(d.colonia.is_empty());
        // User-entered fields survive.
        assert_eq!(d.calle, "Av. Reforma");
    }

    #[test]
    fn direccion_se_aplana_en_el_json() {
        let c = cliente_valido();
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["codigo_postal"], "06600");
        assert_eq!(v["calle"], "Av. Reforma");
        assert!(v.get("direccion").is_none(), "address must serialize flat");
    }
}
