//! Quote composer: collects the package parameters, submits the pricing
//! request and holds the filtered result until a service is selected.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use envios_api::{ApiClient, SolicitudCotizacion};
use envios_core::{CargosAdicionales, OpcionEmpaque, ServicioCotizado, TipoPaquete};

use crate::error::WizardError;

/// International SKUs follow the `GED01..GED05` / `GEN01..GEN05` scheme; the
/// trailing digit is the zone.
fn sku_internacional() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^G(E[DN]0[1-5])$").expect("literal regex is valid"))
}

/// Package-level quote inputs.
#[derive(Debug, Clone)]
pub struct ParametrosPaquete {
    pub tipo: TipoPaquete,
    pub peso: f64,
    /// Declared value when the shipment is insured.
    pub valor_seguro: Option<Decimal>,
    pub empaque: OpcionEmpaque,
    pub requiere_recoleccion: bool,
    pub precio_recoleccion: Option<Decimal>,
}

/// Where the shipment is going, for pricing purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RutaCotizacion {
    /// International destination. The zone (1–5) may be picked after the
    /// quote is requested; forward progress is gated on it.
    Internacional { zona: Option<u8> },
    /// Domestic route; the server derives the zone from the two codes.
    Nacional { origen: String, destino: String },
}

/// The retained quote result after filtering.
#[derive(Debug, Clone)]
pub struct ResultadoCotizacion {
    pub servicios: Vec<ServicioCotizado>,
    pub cargos: CargosAdicionales,
    pub iva: Option<Decimal>,
    pub peso_facturable: f64,
    /// Σ `precio_con_iva` over the retained services plus the IVA-inclusive
    /// add-on charges.
    pub gran_total: Decimal,
}

/// Client-side quote state: parameters in, candidate services out, at most
/// one selected.
#[derive(Debug, Clone)]
pub struct Cotizador {
    parametros: ParametrosPaquete,
    ruta: RutaCotizacion,
    requiere_reexpedicion: bool,
    resultado: Option<ResultadoCotizacion>,
    seleccionado: Option<usize>,
}

impl Cotizador {
    /// Starts a quote for the given package and route.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] for an out-of-range zone or a
    /// bring-your-own packaging option without a price.
    pub fn new(parametros: ParametrosPaquete, ruta: RutaCotizacion) -> Result<Self, WizardError> {
        if let RutaCotizacion::Internacional { zona: Some(z) } = &ruta {
            validar_zona(*z)?;
        }
        if matches!(parametros.empaque, OpcionEmpaque::Emp05 { precio } if precio <= Decimal::ZERO)
        {
            return Err(WizardError::TransicionInvalida(
                "EMP05 requiere un precio de empaque",
            ));
        }
        Ok(Self {
            parametros,
            ruta,
            requiere_reexpedicion: false,
            resultado: None,
            seleccionado: None,
        })
    }

    pub fn ruta(&self) -> &RutaCotizacion {
        &self.ruta
    }

    pub fn es_internacional(&self) -> bool {
        matches!(self.ruta, RutaCotizacion::Internacional { .. })
    }

    /// Picks the destination zone for an international quote.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] when the route is domestic or the
    /// zone is out of range.
    pub fn set_zona(&mut self, zona: u8) -> Result<(), WizardError> {
        validar_zona(zona)?;
        match &mut self.ruta {
            RutaCotizacion::Internacional { zona: z } => {
                *z = Some(zona);
                Ok(())
            }
            RutaCotizacion::Nacional { .. } => Err(WizardError::TransicionInvalida(
                "la zona solo aplica a envíos internacionales",
            )),
        }
    }

    /// Feeds the carrier-validation outcome into the quote. The raw text is
    /// parsed by the caller; only the boolean reaches the pricing request.
    pub fn set_reexpedicion(&mut self, requiere: bool) {
        self.requiere_reexpedicion = requiere;
    }

    /// Builds the wire request for the current parameters.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] for an international quote with
    /// no zone selected yet.
    pub fn solicitud(&self) -> Result<SolicitudCotizacion, WizardError> {
        let (zona, origen, destino, internacional) = match &self.ruta {
            RutaCotizacion::Internacional { zona: Some(z) } => (Some(*z), None, None, true),
            RutaCotizacion::Internacional { zona: None } => {
                return Err(WizardError::TransicionInvalida(
                    "selecciona una zona de destino",
                ));
            }
            RutaCotizacion::Nacional { origen, destino } => {
                (None, Some(origen.clone()), Some(destino.clone()), false)
            }
        };
        Ok(SolicitudCotizacion {
            zona,
            codigo_postal_origen: origen,
            codigo_postal_destino: destino,
            tipo_paquete: self.parametros.tipo.clave().to_owned(),
            peso: self.parametros.peso,
            peso_volumetrico: self.parametros.tipo.peso_volumetrico(),
            es_internacional: internacional,
            valor_seguro: self.parametros.valor_seguro.unwrap_or(Decimal::ZERO),
            opcion_empaque: self.parametros.empaque.clave().to_owned(),
            precio_empaque_personalizado: self.parametros.empaque.precio_personalizado(),
            requiere_recoleccion: self.parametros.requiere_recoleccion,
            precio_recoleccion: self.parametros.precio_recoleccion,
            requiere_reexpedicion: self.requiere_reexpedicion,
        })
    }

    /// Submits the pricing request and retains the filtered result. Any
    /// previous selection is discarded.
    ///
    /// # Errors
    ///
    /// [`WizardError::Api`] on pricing failures — including the verbatim
    /// server message when the payload reports `exito: false`.
    pub async fn cotizar(&mut self, api: &ApiClient) -> Result<&ResultadoCotizacion, WizardError> {
        let solicitud = self.solicitud()?;
        let respuesta = api.cotizar(&solicitud).await?;

        let internacional = solicitud.es_internacional;
        let servicios: Vec<ServicioCotizado> = respuesta
            .servicios
            .into_iter()
            .filter(|s| {
                if internacional {
                    sku_internacional().is_match(&s.sku)
                } else {
                    !s.es_internacional
                }
            })
            .collect();

        let cargos = respuesta.cargos_adicionales;
        let gran_total = servicios
            .iter()
            .map(|s| s.precio_con_iva)
            .sum::<Decimal>()
            + cargos.suma();

        self.seleccionado = None;
        Ok(self.resultado.insert(ResultadoCotizacion {
            servicios,
            cargos,
            iva: respuesta.iva,
            peso_facturable: respuesta.peso_facturable,
            gran_total: gran_total.round_dp(2),
        }))
    }

    pub fn resultado(&self) -> Option<&ResultadoCotizacion> {
        self.resultado.as_ref()
    }

    /// Marks the service line to proceed with. Exactly one may be selected.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] when no quote is held or the SKU
    /// is not among the retained services.
    pub fn seleccionar(&mut self, sku: &str) -> Result<(), WizardError> {
        let resultado = self
            .resultado
            .as_ref()
            .ok_or(WizardError::TransicionInvalida("aún no hay cotización"))?;
        let indice = resultado
            .servicios
            .iter()
            .position(|s| s.sku == sku)
            .ok_or(WizardError::TransicionInvalida(
                "el servicio no pertenece a esta cotización",
            ))?;
        self.seleccionado = Some(indice);
        Ok(())
    }

    pub fn seleccionado(&self) -> Option<&ServicioCotizado> {
        let resultado = self.resultado.as_ref()?;
        resultado.servicios.get(self.seleccionado?)
    }

    /// Gate for leaving the quote step: a service must be selected, and an
    /// international selection additionally needs its zone.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] naming the missing requirement.
    pub fn puede_continuar(&self) -> Result<(), WizardError> {
        let Some(servicio) = self.seleccionado() else {
            return Err(WizardError::TransicionInvalida(
                "selecciona un servicio para continuar",
            ));
        };
        if servicio.es_internacional
            && matches!(self.ruta, RutaCotizacion::Internacional { zona: None })
        {
            return Err(WizardError::TransicionInvalida(
                "selecciona una zona de destino",
            ));
        }
        Ok(())
    }
}

fn validar_zona(zona: u8) -> Result<(), WizardError> {
    if (1..=5).contains(&zona) {
        Ok(())
    } else {
        Err(WizardError::TransicionInvalida("la zona debe estar entre 1 y 5"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servicio(sku: &str, precio_con_iva: Decimal, internacional: bool) -> ServicioCotizado {
        ServicioCotizado {
            sku: sku.to_owned(),
            nombre: sku.to_owned(),
            precio_base: precio_con_iva,
            cargo_sobrepeso: Decimal::ZERO,
            dias_estimados: 3,
            precio_con_iva,
            es_internacional: internacional,
        }
    }

    fn parametros() -> ParametrosPaquete {
        ParametrosPaquete {
            tipo: TipoPaquete::Sobre,
            peso: 0.5,
            valor_seguro: None,
            empaque: OpcionEmpaque::Emp00,
            requiere_recoleccion: false,
            precio_recoleccion: None,
        }
    }

    fn con_resultado(ruta: RutaCotizacion, servicios: Vec<ServicioCotizado>) -> Cotizador {
        let mut c = Cotizador::new(parametros(), ruta).unwrap();
        c.resultado = Some(ResultadoCotizacion {
            servicios,
            cargos: CargosAdicionales::default(),
            iva: None,
            peso_facturable: 0.5,
            gran_total: Decimal::ZERO,
        });
        c
    }

    #[test]
    fn el_filtro_internacional_reconoce_los_skus() {
        for sku in ["GED01", "GED05", "GEN03"] {
            assert!(sku_internacional().is_match(sku), "{sku}");
        }
        for sku in ["GDN03", "GED06", "XGED01", "GED011", "ged01"] {
            assert!(!sku_internacional().is_match(sku), "{sku}");
        }
    }

    #[test]
    fn zona_fuera_de_rango_se_rechaza() {
        let err = Cotizador::new(
            parametros(),
            RutaCotizacion::Internacional { zona: Some(6) },
        )
        .unwrap_err();
        assert!(matches!(err, WizardError::TransicionInvalida(_)));
    }

    #[test]
    fn emp05_sin_precio_se_rechaza() {
        let mut p = parametros();
        p.empaque = OpcionEmpaque::Emp05 {
            precio: Decimal::ZERO,
        };
        assert!(Cotizador::new(p, RutaCotizacion::Internacional { zona: Some(1) }).is_err());
    }

    #[test]
    fn solicitud_internacional_sin_zona_falla() {
        let c = Cotizador::new(parametros(), RutaCotizacion::Internacional { zona: None }).unwrap();
        assert!(c.solicitud().is_err());
    }

    #[test]
    fn servicio_internacional_sin_zona_bloquea_y_la_zona_desbloquea() {
        let mut c = con_resultado(
            RutaCotizacion::Internacional { zona: None },
            vec![servicio("GED03", Decimal::from(900), true)],
        );
        c.seleccionar("GED03").unwrap();
        assert!(c.puede_continuar().is_err(), "no zone selected yet");

        c.set_zona(3).unwrap();
        assert!(c.puede_continuar().is_ok());
    }

    #[test]
    fn sin_seleccion_no_se_puede_continuar() {
        let c = con_resultado(
            RutaCotizacion::Nacional {
                origen: "06600".to_owned(),
                destino: "44160".to_owned(),
            },
            vec![servicio("GDN03", Decimal::from(336), false)],
        );
        assert!(c.puede_continuar().is_err());
    }

    #[test]
    fn seleccionar_sku_ajeno_falla() {
        let mut c = con_resultado(
            RutaCotizacion::Nacional {
                origen: "06600".to_owned(),
                destino: "44160".to_owned(),
            },
            vec![servicio("GDN03", Decimal::from(336), false)],
        );
        assert!(c.seleccionar("GED01").is_err());
        assert!(c.seleccionar("GDN03").is_ok());
        assert_eq!(c.seleccionado().map(|s| s.sku.as_str()), Some("GDN03"));
    }

    #[test]
    fn set_zona_en_ruta_nacional_falla() {
        let mut c = con_resultado(
            RutaCotizacion::Nacional {
                origen: "06600".to_owned(),
                destino: "44160".to_owned(),
            },
            vec![],
        );
        assert!(c.set_zona(2).is_err());
    }
}
