//! Quote-side domain types: candidate service lines, add-on charges and the
//! package description submitted for pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::peso;

/// One candidate carrier service returned by the pricing API for a given
/// (zone, weight, package type) tuple. Ephemeral: recomputed on every quote
/// request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicioCotizado {
    pub sku: String,
    pub nombre: String,
    pub precio_base: Decimal,
    #[serde(default)]
    pub cargo_sobrepeso: Decimal,
    #[serde(default)]
    pub dias_estimados: u32,
    pub precio_con_iva: Decimal,
    #[serde(default)]
    pub es_internacional: bool,
}

/// IVA-inclusive add-on charges the pricing API computed for this quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CargosAdicionales {
    #[serde(default)]
    pub empaque: Decimal,
    #[serde(default)]
    pub seguro: Decimal,
    #[serde(default)]
    pub recoleccion: Decimal,
    #[serde(default)]
    pub reexpedicion: Decimal,
}

impl CargosAdicionales {
    #[must_use]
    pub fn suma(&self) -> Decimal {
        self.empaque + self.seguro + self.recoleccion + self.reexpedicion
    }
}

/// What is being shipped: a box with dimensions, or a flat envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TipoPaquete {
    Paquete { largo: f64, ancho: f64, alto: f64 },
    Sobre,
}

impl TipoPaquete {
    /// Wire value for the `tipoPaquete` request field.
    #[must_use]
    pub fn clave(&self) -> &'static str {
        match self {
            TipoPaquete::Paquete { .. } => "Paquete",
            TipoPaquete::Sobre => "Sobre",
        }
    }

    /// Volumetric weight in kg. Envelopes have none.
    #[must_use]
    pub fn peso_volumetrico(&self) -> f64 {
        match *self {
            TipoPaquete::Paquete { largo, ancho, alto } => {
                peso::peso_volumetrico(largo, ancho, alto)
            }
            TipoPaquete::Sobre => 0.0,
        }
    }
}

/// Packaging options offered at quote time. `Emp05` is the bring-your-own
/// option and carries a mandatory custom price; the rest are priced
/// server-side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpcionEmpaque {
    Emp00,
    Emp01,
    Emp02,
    Emp03,
    Emp04,
    Emp05 { precio: Decimal },
}

impl OpcionEmpaque {
    /// Wire value for the `opcionEmpaque` request field.
    #[must_use]
    pub fn clave(&self) -> &'static str {
        match self {
            OpcionEmpaque::Emp00 => "EMP00",
            OpcionEmpaque::Emp01 => "EMP01",
            OpcionEmpaque::Emp02 => "EMP02",
            OpcionEmpaque::Emp03 => "EMP03",
            OpcionEmpaque::Emp04 => "EMP04",
            OpcionEmpaque::Emp05 { .. } => "EMP05",
        }
    }

    /// Custom price for the `EMP05` option; `None` otherwise.
    #[must_use]
    pub fn precio_personalizado(&self) -> Option<Decimal> {
        match self {
            OpcionEmpaque::Emp05 { precio } => Some(*precio),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sobre_no_tiene_peso_volumetrico() {
        assert!(TipoPaquete::Sobre.peso_volumetrico().abs() < f64::EPSILON);
    }

    #[test]
    fn paquete_calcula_peso_volumetrico() {
        let p = TipoPaquete::Paquete {
            largo: 30.0,
            ancho: 25.0,
            alto: 10.0,
        };
        assert!((p.peso_volumetrico() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn claves_de_empaque() {
        assert_eq!(OpcionEmpaque::Emp00.clave(), "EMP00");
        let propio = OpcionEmpaque::Emp05 {
            precio: Decimal::new(4550, 2),
        };
        assert_eq!(propio.clave(), "EMP05");
        assert_eq!(propio.precio_personalizado(), Some(Decimal::new(4550, 2)));
        assert_eq!(OpcionEmpaque::Emp02.precio_personalizado(), None);
    }
}
