//! The wizard state machine.
//!
//! Forward transitions are guarded; backward transitions are always allowed
//! and lossless. The zip-drift check on the confirmation screen is a policy
//! decision carried in configuration: warn-only keeps the observed behavior,
//! block refuses submission until the codes match the quoted ones again.

use rust_decimal::Decimal;

use envios_api::{ArchivoEtiqueta, DireccionCp};
use envios_carriers::{EtiquetaManuable, TarifaManuable};
use envios_core::{ChangeTracker, Cliente, Descuento, Destino, PoliticaDriftCp};

use crate::cotizador::{Cotizador, RutaCotizacion};
use crate::error::WizardError;

/// Top-level wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paso {
    Cotizacion,
    DatosCliente(SubPaso),
}

/// Sub-steps within the customer-data screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPaso {
    Formulario,
    Confirmacion,
}

/// The third-party shipping sub-selector on the confirmation screen.
/// `Ninguna` means nothing chosen yet and blocks submission; the in-house
/// path is an explicit choice like the other two.
#[derive(Debug, Clone)]
pub enum OpcionTerceros {
    Ninguna,
    Interna,
    Externa {
        paqueteria: String,
        numero_guia: String,
        etiqueta: ArchivoEtiqueta,
        costo_neto: Decimal,
    },
    Manuable {
        tarifa: TarifaManuable,
        /// Filled once the label is bought; the submitter buys it when absent.
        etiqueta: Option<EtiquetaManuable>,
    },
}

/// The wizard: quote step, then customer data (form → confirmation), then
/// submission.
pub struct WizardController {
    paso: Paso,
    cotizador: Cotizador,
    politica_drift: PoliticaDriftCp,
    cliente: Option<ChangeTracker<Cliente>>,
    destino: Option<ChangeTracker<Destino>>,
    contenido: String,
    opcion: OpcionTerceros,
    descuento: Option<Descuento>,
}

impl WizardController {
    pub fn new(cotizador: Cotizador, politica_drift: PoliticaDriftCp) -> Self {
        Self {
            paso: Paso::Cotizacion,
            cotizador,
            politica_drift,
            cliente: None,
            destino: None,
            contenido: String::new(),
            opcion: OpcionTerceros::Ninguna,
            descuento: None,
        }
    }

    pub fn paso(&self) -> Paso {
        self.paso
    }

    pub fn cotizador(&self) -> &Cotizador {
        &self.cotizador
    }

    pub fn cotizador_mut(&mut self) -> &mut Cotizador {
        &mut self.cotizador
    }

    /// Loads (or replaces) the customer being shipped for. Selecting an
    /// existing record resets its snapshot and clears pending changes.
    pub fn seleccionar_cliente(&mut self, cliente: Cliente) {
        match &mut self.cliente {
            Some(tracker) => tracker.select(cliente),
            None => self.cliente = Some(ChangeTracker::new(cliente)),
        }
    }

    pub fn seleccionar_destino(&mut self, destino: Destino) {
        match &mut self.destino {
            Some(tracker) => tracker.select(destino),
            None => self.destino = Some(ChangeTracker::new(destino)),
        }
    }

    pub fn cliente(&self) -> Option<&ChangeTracker<Cliente>> {
        self.cliente.as_ref()
    }

    pub fn cliente_mut(&mut self) -> Option<&mut ChangeTracker<Cliente>> {
        self.cliente.as_mut()
    }

    pub fn destino(&self) -> Option<&ChangeTracker<Destino>> {
        self.destino.as_ref()
    }

    pub fn destino_mut(&mut self) -> Option<&mut ChangeTracker<Destino>> {
        self.destino.as_mut()
    }

    /// Merges a postal-lookup result into the customer form. Both the live
    /// record and its snapshot receive the fill, so the round-trip never
    /// reads as a user edit.
    pub fn autocompletar_cliente(&mut self, direccion: &DireccionCp) {
        if let Some(tracker) = &mut self.cliente {
            aplicar_lookup(tracker, direccion, |c| &mut c.direccion);
        }
    }

    pub fn autocompletar_destino(&mut self, direccion: &DireccionCp) {
        if let Some(tracker) = &mut self.destino {
            aplicar_lookup(tracker, direccion, |d| &mut d.direccion);
        }
    }

    /// Clears the lookup-derived customer fields after a failed lookup, so
    /// stale autofill does not survive an invalid code. Runs through the
    /// autofill path: clearing is system-driven, not a user edit.
    pub fn limpiar_autofill_cliente(&mut self) {
        if let Some(tracker) = &mut self.cliente {
            tracker.apply_autofill(|c| c.direccion.limpiar_derivados());
        }
    }

    pub fn limpiar_autofill_destino(&mut self) {
        if let Some(tracker) = &mut self.destino {
            tracker.apply_autofill(|d| d.direccion.limpiar_derivados());
        }
    }

    pub fn set_contenido(&mut self, contenido: &str) {
        self.contenido = contenido.to_owned();
    }

    pub fn contenido(&self) -> &str {
        &self.contenido
    }

    pub fn elegir_opcion(&mut self, opcion: OpcionTerceros) {
        self.opcion = opcion;
    }

    pub fn opcion(&self) -> &OpcionTerceros {
        &self.opcion
    }

    pub fn set_descuento(&mut self, descuento: Option<Descuento>) {
        self.descuento = descuento;
    }

    pub fn descuento(&self) -> Option<&Descuento> {
        self.descuento.as_ref()
    }

    /// `quote → customer-data`: requires a selected service (and a zone for
    /// an international selection).
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] naming the missing requirement.
    pub fn continuar_a_datos(&mut self) -> Result<(), WizardError> {
        if self.paso != Paso::Cotizacion {
            return Err(WizardError::TransicionInvalida("ya estás en datos del cliente"));
        }
        self.cotizador.puede_continuar()?;
        self.paso = Paso::DatosCliente(SubPaso::Formulario);
        Ok(())
    }

    /// `form → confirmation`: customer and destination present and valid,
    /// plus a non-empty content description.
    ///
    /// # Errors
    ///
    /// [`WizardError::TransicionInvalida`] or a field-level
    /// [`WizardError::Validacion`].
    pub fn continuar_a_confirmacion(&mut self) -> Result<(), WizardError> {
        if self.paso != Paso::DatosCliente(SubPaso::Formulario) {
            return Err(WizardError::TransicionInvalida("no estás en el formulario"));
        }
        let cliente = self
            .cliente
            .as_ref()
            .ok_or(WizardError::TransicionInvalida("falta el cliente"))?;
        let destino = self
            .destino
            .as_ref()
            .ok_or(WizardError::TransicionInvalida("falta el destino"))?;
        cliente.current().validar()?;
        destino.current().validar()?;
        if self.contenido.trim().is_empty() {
            return Err(WizardError::TransicionInvalida(
                "describe el contenido del paquete",
            ));
        }
        self.paso = Paso::DatosCliente(SubPaso::Confirmacion);
        Ok(())
    }

    /// Backward transition. Always permitted; nothing entered is discarded.
    pub fn regresar(&mut self) {
        self.paso = match self.paso {
            Paso::Cotizacion | Paso::DatosCliente(SubPaso::Formulario) => Paso::Cotizacion,
            Paso::DatosCliente(SubPaso::Confirmacion) => Paso::DatosCliente(SubPaso::Formulario),
        };
    }

    /// Full reset, e.g. when international shipping is toggled off: the new
    /// quote replaces everything entered so far.
    pub fn reset(&mut self, cotizador: Cotizador) {
        *self = Self::new(cotizador, self.politica_drift);
    }

    /// Postal codes that drifted from the quoted ones, as display text.
    /// `None` when nothing drifted or the quote was international.
    #[must_use]
    pub fn advertencia_drift(&self) -> Option<String> {
        let RutaCotizacion::Nacional { origen, destino } = self.cotizador.ruta() else {
            return None;
        };
        let mut partes = Vec::new();
        if let Some(cliente) = &self.cliente {
            let actual = &cliente.current().direccion.codigo_postal;
            if actual != origen {
                partes.push(format!("origen cotizado {origen}, cliente {actual}"));
            }
        }
        if let Some(dest) = &self.destino {
            let actual = &dest.current().direccion.codigo_postal;
            if actual != destino {
                partes.push(format!("destino cotizado {destino}, destino {actual}"));
            }
        }
        if partes.is_empty() {
            None
        } else {
            Some(partes.join("; "))
        }
    }

    /// Final gate before the submission sequence runs.
    ///
    /// # Errors
    ///
    /// - [`WizardError::TransicionInvalida`] off the confirmation screen,
    ///   with no option chosen, or with option-specific fields missing.
    /// - [`WizardError::DriftCodigoPostal`] under the blocking drift policy.
    pub fn listo_para_enviar(&self) -> Result<(), WizardError> {
        if self.paso != Paso::DatosCliente(SubPaso::Confirmacion) {
            return Err(WizardError::TransicionInvalida(
                "confirma los datos antes de enviar",
            ));
        }
        match &self.opcion {
            OpcionTerceros::Ninguna => {
                return Err(WizardError::TransicionInvalida(
                    "elige una opción de envío",
                ));
            }
            OpcionTerceros::Interna | OpcionTerceros::Manuable { .. } => {}
            OpcionTerceros::Externa {
                paqueteria,
                numero_guia,
                etiqueta,
                costo_neto,
            } => {
                if paqueteria.trim().is_empty() || numero_guia.trim().is_empty() {
                    return Err(WizardError::TransicionInvalida(
                        "la opción externa requiere paquetería y número de guía",
                    ));
                }
                if etiqueta.contenido.is_empty() {
                    return Err(WizardError::TransicionInvalida(
                        "adjunta el archivo de la etiqueta externa",
                    ));
                }
                if *costo_neto <= Decimal::ZERO {
                    return Err(WizardError::TransicionInvalida(
                        "captura el costo neto de la guía externa",
                    ));
                }
            }
        }
        if let Some(detalle) = self.advertencia_drift() {
            match self.politica_drift {
                PoliticaDriftCp::Advertir => {
                    tracing::warn!(%detalle, "códigos postales difieren de la cotización");
                }
                PoliticaDriftCp::Bloquear => {
                    return Err(WizardError::DriftCodigoPostal { detalle });
                }
            }
        }
        Ok(())
    }
}

/// Writes a lookup result into an address block through the tracker's
/// autofill path. The colonia keeps the user's pick when it is still a
/// valid candidate, otherwise falls back to the first one.
fn aplicar_lookup<T>(
    tracker: &mut ChangeTracker<T>,
    direccion: &DireccionCp,
    campo: impl Fn(&mut T) -> &mut envios_core::Direccion,
) where
    T: serde::Serialize + Clone,
{
    tracker.apply_autofill(|registro| {
        let dir = campo(registro);
        dir.estado = direccion.estado.clone();
        dir.municipio = direccion.municipio.clone();
        dir.ciudad = direccion.ciudad.clone();
        let actual = if dir.colonia.is_empty() {
            None
        } else {
            Some(dir.colonia.as_str())
        };
        if let Some(colonia) = direccion.colonia_predeterminada(actual) {
            dir.colonia = colonia.to_owned();
        }
    });
}
