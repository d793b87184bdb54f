//! Money arithmetic for shipment costs: discounts, IVA and the final
//! breakdown persisted on an [`crate::Envio`].
//!
//! All peso amounts are `rust_decimal::Decimal` rounded to 2 decimal places.
//! The breakdown is recomputed from its components at submission time,
//! independently of the totals the pricing API displayed during quoting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default IVA rate (16%), used when the pricing response omits one.
#[must_use]
pub fn iva_predeterminado() -> Decimal {
    Decimal::new(16, 2)
}

/// A discount applied to the pre-IVA subtotal of a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum Descuento {
    /// Percentage of the subtotal, `0..=100`.
    Porcentaje { valor: Decimal },
    /// Fixed amount in pesos.
    Monto { valor: Decimal },
    /// A promotional code resolved server-side to a fixed amount.
    Codigo { codigo: String, valor: Decimal },
}

impl Descuento {
    /// The amount actually subtracted for a given subtotal.
    ///
    /// Capped to `0..=subtotal`: a discount can never drive the total
    /// negative, regardless of its nominal value.
    #[must_use]
    pub fn monto_aplicado(&self, subtotal: Decimal) -> Decimal {
        let bruto = match self {
            Descuento::Porcentaje { valor } => {
                (subtotal * *valor / Decimal::ONE_HUNDRED).round_dp(2)
            }
            Descuento::Monto { valor } | Descuento::Codigo { valor, .. } => *valor,
        };
        bruto.max(Decimal::ZERO).min(subtotal)
    }
}

/// Pre-IVA cost components of a shipment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentesCosto {
    pub envio: Decimal,
    pub seguro: Decimal,
    pub empaque: Decimal,
    pub recoleccion: Decimal,
    pub reexpedicion: Decimal,
}

impl ComponentesCosto {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.envio + self.seguro + self.empaque + self.recoleccion + self.reexpedicion
    }
}

/// The cost fields persisted on a shipment record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesgloseEnvio {
    pub costo_envio: Decimal,
    pub costo_seguro: Decimal,
    pub costo_empaque: Decimal,
    pub costo_recoleccion: Decimal,
    pub costo_reexpedicion: Decimal,
    pub descuento: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
}

/// Combines the pre-IVA components with an optional discount and applies IVA.
///
/// `tasa_iva` is the server-supplied rate when present; otherwise the 16%
/// default applies. Every output field is rounded to 2 decimals.
#[must_use]
pub fn desglose_envio(
    componentes: &ComponentesCosto,
    descuento: Option<&Descuento>,
    tasa_iva: Option<Decimal>,
) -> DesgloseEnvio {
    let tasa = tasa_iva.unwrap_or_else(iva_predeterminado);
    let subtotal = componentes.subtotal();
    let monto_descuento = descuento
        .map(|d| d.monto_aplicado(subtotal))
        .unwrap_or(Decimal::ZERO);
    let base = subtotal - monto_descuento;
    let iva = (base * tasa).round_dp(2);
    DesgloseEnvio {
        costo_envio: componentes.envio.round_dp(2),
        costo_seguro: componentes.seguro.round_dp(2),
        costo_empaque: componentes.empaque.round_dp(2),
        costo_recoleccion: componentes.recoleccion.round_dp(2),
        costo_reexpedicion: componentes.reexpedicion.round_dp(2),
        descuento: monto_descuento.round_dp(2),
        iva,
        total: (base + iva).round_dp(2),
    }
}
