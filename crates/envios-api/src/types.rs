//! Wire types for the backend API.
//!
//! The postal catalog speaks SEPOMEX column names (`d_estado`, `d_mnpio`,
//! `d_asenta`); everything else uses the backend's own field names.

use serde::Deserialize;

/// Raw envelope of `zip_codes.php`.
#[derive(Debug, Deserialize)]
pub(crate) struct RespuestaZipCodes {
    #[serde(default)]
    pub zip_codes: Vec<EntradaZipCode>,
}

/// One SEPOMEX row: a single colonia within the queried postal code.
#[derive(Debug, Deserialize)]
pub(crate) struct EntradaZipCode {
    pub d_estado: String,
    pub d_mnpio: String,
    #[serde(default)]
    pub d_ciudad: String,
    pub d_asenta: String,
}

/// Resolved address data for a postal code: one state/municipality and the
/// candidate colonia list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DireccionCp {
    pub estado: String,
    pub municipio: String,
    pub ciudad: String,
    pub colonias: Vec<String>,
}

impl DireccionCp {
    /// Default colonia selection: keep `actual` if it is already one of the
    /// candidates (edit-existing-record case), otherwise the first candidate.
    #[must_use]
    pub fn colonia_predeterminada<'a>(&'a self, actual: Option<&'a str>) -> Option<&'a str> {
        if let Some(colonia) = actual {
            if self.colonias.iter().any(|c| c == colonia) {
                return Some(colonia);
            }
        }
        self.colonias.first().map(String::as_str)
    }
}

/// Delivery-frequency data for a postal code.
#[derive(Debug, Clone, Deserialize)]
pub struct FrecuenciaEntrega {
    #[serde(default)]
    pub lunes: bool,
    #[serde(default)]
    pub martes: bool,
    #[serde(default)]
    pub miercoles: bool,
    #[serde(default)]
    pub jueves: bool,
    #[serde(default)]
    pub viernes: bool,
    #[serde(default)]
    pub sabado: bool,
    #[serde(default)]
    pub domingo: bool,
    #[serde(default)]
    pub frecuencia: Option<String>,
    #[serde(default)]
    pub garantia_maxima: Option<String>,
    #[serde(default)]
    pub zona_extendida: bool,
    #[serde(default)]
    pub ocurre_forzoso: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Session data returned by `login.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct SesionIniciada {
    pub token: String,
    pub user: UsuarioSesion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsuarioSesion {
    pub role: String,
    pub username: String,
    pub id: i64,
}

/// One page of CRUD results.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginado<T> {
    pub data: Vec<T>,
    pub total: i64,
}

/// Match mode for advanced search: every criterion, or any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModoBusqueda {
    Todos,
    Cualquiera,
}

impl ModoBusqueda {
    /// Wire value of the `match` request field.
    #[must_use]
    pub fn clave(self) -> &'static str {
        match self {
            ModoBusqueda::Todos => "all",
            ModoBusqueda::Cualquiera => "any",
        }
    }
}
