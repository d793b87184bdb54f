//! The submission sequence: persist the customer, then the destination,
//! then the shipment, in that order.
//!
//! Only destination **updates** are retried on 429, and their exhaustion is
//! swallowed — the shipment is created regardless. There is no compensating
//! rollback: a late failure surfaces the ids already persisted so the
//! operator can clean up.

use rust_decimal::Decimal;

use envios_api::{retry_with_backoff, ApiClient, ApiError, ArchivoEtiqueta, Catalogo, DireccionCp};
use envios_carriers::ManuableClient;
use envios_core::costos::iva_predeterminado;
use envios_core::{
    desglose_envio, Cliente, ComponentesCosto, Destino, Envio, EstatusEnvio, MetodoCreacion,
};

use crate::controller::{OpcionTerceros, WizardController};
use crate::error::WizardError;
use crate::sesion::SessionStore;

/// Runs both postal lookups for a domestic route concurrently. The results
/// land in disjoint form slices, so whichever resolves last wins only its
/// own target.
pub async fn buscar_codigos(
    api: &ApiClient,
    origen: &str,
    destino: &str,
) -> (
    Result<DireccionCp, ApiError>,
    Result<DireccionCp, ApiError>,
) {
    futures::join!(
        api.buscar_codigo_postal(origen),
        api.buscar_codigo_postal(destino)
    )
}

/// Outcome of a completed submission.
#[derive(Debug)]
pub struct ResultadoEnvio {
    pub envio: Envio,
    /// Non-fatal incidents: swallowed destination-update retries and the
    /// zip-drift warning under the warn-only policy.
    pub advertencias: Vec<String>,
}

/// Orchestrates the create-or-update sequence behind the confirmation
/// screen.
pub struct EnvioSubmitter<'a> {
    api: &'a ApiClient,
    manuable: Option<&'a ManuableClient>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl<'a> EnvioSubmitter<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            manuable: None,
            max_retries: 3,
            backoff_base_secs: 2,
        }
    }

    /// Supplies the aggregator client, required only when the Manuable
    /// option still needs its label bought.
    #[must_use]
    pub fn con_manuable(mut self, manuable: &'a ManuableClient) -> Self {
        self.manuable = Some(manuable);
        self
    }

    /// Overrides the destination-update retry schedule (tests use a zero
    /// base to avoid sleeping).
    #[must_use]
    pub fn con_reintentos(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    /// Runs the full sequence: customer, destination, method notification,
    /// cost recombination, shipment creation, marker cleanup.
    ///
    /// # Errors
    ///
    /// - [`WizardError::TransicionInvalida`] when the wizard guards refuse.
    /// - [`WizardError::Api`] on customer or destination-create failures.
    /// - [`WizardError::Carrier`] if the Manuable label purchase fails.
    /// - [`WizardError::EnvioFallido`] when shipment creation fails after
    ///   earlier records were persisted.
    pub async fn enviar(
        &self,
        wizard: &mut WizardController,
        mut sesion: Option<&mut SessionStore>,
    ) -> Result<ResultadoEnvio, WizardError> {
        wizard.listo_para_enviar()?;
        let mut advertencias = Vec::new();
        if let Some(detalle) = wizard.advertencia_drift() {
            advertencias.push(format!("códigos postales difieren de los cotizados: {detalle}"));
        }

        let cliente_id = self.guardar_cliente(wizard).await?;
        let destino_id = self
            .guardar_destino(wizard, cliente_id, &mut advertencias)
            .await?;

        let opcion = wizard.opcion().clone();
        let Some(clave_metodo) = clave_de_opcion(&opcion) else {
            return Err(WizardError::TransicionInvalida("elige una opción de envío"));
        };

        // Best-effort: tell the backend which method the quotation session
        // ended up using. Never blocks shipment creation.
        let cotizacion_id = sesion
            .as_ref()
            .and_then(|s| s.cotizacion_id().map(str::to_owned));
        if let Some(id) = &cotizacion_id {
            if let Err(e) = self.api.notificar_metodo_cotizacion(id, clave_metodo).await {
                tracing::warn!(cotizacion_id = %id, error = %e, "method notification failed — continuing");
            }
        }

        let (metodo, etiqueta_externa) = self.resolver_metodo(opcion).await?;
        let envio = self.armar_envio(wizard, cliente_id, destino_id, metodo)?;

        let creado = self
            .api
            .crear_envio(&envio, etiqueta_externa.as_ref())
            .await
            .map_err(|source| WizardError::EnvioFallido {
                cliente_id: Some(cliente_id),
                destino_id: Some(destino_id),
                source,
            })?;

        if let Some(store) = sesion.as_deref_mut() {
            store.set_cotizacion_id(None)?;
        }

        Ok(ResultadoEnvio {
            envio: creado,
            advertencias,
        })
    }

    /// Step 1: create or update the customer. Skipped entirely when the
    /// record exists and carries no genuine edits.
    async fn guardar_cliente(&self, wizard: &mut WizardController) -> Result<i64, WizardError> {
        let tracker = wizard
            .cliente_mut()
            .ok_or(WizardError::TransicionInvalida("falta el cliente"))?;

        if tracker.needs_save() {
            match tracker.current().id {
                None => {
                    let creado: Cliente =
                        self.api.crear(Catalogo::Clientes, tracker.current()).await?;
                    let id = creado
                        .id
                        .ok_or_else(|| sin_id_asignado("cliente"))?;
                    tracker.select(creado);
                    return Ok(id);
                }
                Some(id) => {
                    let actualizado: Cliente = self
                        .api
                        .actualizar(Catalogo::Clientes, id, tracker.current())
                        .await?;
                    tracker.select(actualizado);
                    return Ok(id);
                }
            }
        }
        tracker
            .current()
            .id
            .ok_or(WizardError::TransicionInvalida("el cliente no tiene id"))
    }

    /// Step 2: create or update the destination. Creates abort on failure;
    /// updates retry on 429 and swallow exhaustion.
    async fn guardar_destino(
        &self,
        wizard: &mut WizardController,
        cliente_id: i64,
        advertencias: &mut Vec<String>,
    ) -> Result<i64, WizardError> {
        let tracker = wizard
            .destino_mut()
            .ok_or(WizardError::TransicionInvalida("falta el destino"))?;

        if tracker.current().cliente_id != Some(cliente_id) {
            tracker.edit(|d| d.cliente_id = Some(cliente_id));
        }

        if tracker.needs_save() {
            match tracker.current().id {
                None => {
                    let creado: Destino =
                        self.api.crear(Catalogo::Destinos, tracker.current()).await?;
                    let id = creado
                        .id
                        .ok_or_else(|| sin_id_asignado("destino"))?;
                    tracker.select(creado);
                    return Ok(id);
                }
                Some(id) => {
                    let actual = tracker.current().clone();
                    let resultado = retry_with_backoff(
                        self.max_retries,
                        self.backoff_base_secs,
                        || self.api.actualizar::<Destino>(Catalogo::Destinos, id, &actual),
                    )
                    .await;
                    match resultado {
                        Ok(actualizado) => tracker.select(actualizado),
                        Err(e) => {
                            // Throttled past the retry budget: the stale
                            // destination is tolerable, the shipment is not
                            // worth losing.
                            tracing::warn!(destino_id = id, error = %e, "destination update exhausted retries — continuing");
                            advertencias
                                .push(format!("el destino {id} no se pudo actualizar: {e}"));
                        }
                    }
                    return Ok(id);
                }
            }
        }
        tracker
            .current()
            .id
            .ok_or(WizardError::TransicionInvalida("el destino no tiene id"))
    }

    /// Turns the chosen option into the shipment's creation method, buying
    /// the Manuable label on the way when it is still pending.
    async fn resolver_metodo(
        &self,
        opcion: OpcionTerceros,
    ) -> Result<(MetodoCreacion, Option<ArchivoEtiqueta>), WizardError> {
        match opcion {
            OpcionTerceros::Ninguna => Err(WizardError::TransicionInvalida(
                "elige una opción de envío",
            )),
            OpcionTerceros::Interna => Ok((MetodoCreacion::Interno, None)),
            OpcionTerceros::Externa {
                paqueteria,
                numero_guia,
                etiqueta,
                costo_neto,
            } => Ok((
                MetodoCreacion::Externo {
                    paqueteria_externa: paqueteria,
                    numero_guia_externa: numero_guia,
                    costo_neto,
                },
                Some(etiqueta),
            )),
            OpcionTerceros::Manuable { tarifa, etiqueta } => {
                let etiqueta = match etiqueta {
                    Some(e) => e,
                    None => {
                        let manuable = self.manuable.ok_or(WizardError::TransicionInvalida(
                            "configura el cliente de Manuable",
                        ))?;
                        manuable.crear_etiqueta(tarifa.uuid).await?
                    }
                };
                Ok((
                    MetodoCreacion::Manuable {
                        uuid_manuable: tarifa.uuid,
                        servicio_manuable: tarifa.servicio,
                        etiqueta_url: etiqueta.url_etiqueta,
                    },
                    None,
                ))
            }
        }
    }

    /// Step 4: recombine the cost fields from their components, independent
    /// of the totals the quote displayed.
    fn armar_envio(
        &self,
        wizard: &WizardController,
        cliente_id: i64,
        destino_id: i64,
        metodo: MetodoCreacion,
    ) -> Result<Envio, WizardError> {
        let servicio = wizard
            .cotizador()
            .seleccionado()
            .ok_or(WizardError::TransicionInvalida("no hay servicio seleccionado"))?;
        let resultado = wizard
            .cotizador()
            .resultado()
            .ok_or(WizardError::TransicionInvalida("aún no hay cotización"))?;

        let tasa = resultado.iva.unwrap_or_else(iva_predeterminado);
        // The quote's add-on charges arrive IVA-inclusive; strip the tax so
        // the breakdown applies it exactly once.
        let divisor = Decimal::ONE + tasa;
        let sin_iva = |monto: Decimal| (monto / divisor).round_dp(2);
        let componentes = ComponentesCosto {
            envio: servicio.precio_base + servicio.cargo_sobrepeso,
            seguro: sin_iva(resultado.cargos.seguro),
            empaque: sin_iva(resultado.cargos.empaque),
            recoleccion: sin_iva(resultado.cargos.recoleccion),
            reexpedicion: sin_iva(resultado.cargos.reexpedicion),
        };
        let costos = desglose_envio(&componentes, wizard.descuento(), Some(tasa));

        Ok(Envio {
            id: None,
            cliente_id,
            destino_id,
            servicio: servicio.sku.clone(),
            contenido: wizard.contenido().to_owned(),
            costos,
            estatus: EstatusEnvio::Cotizado,
            metodo,
            fecha_creacion: None,
        })
    }
}

fn clave_de_opcion(opcion: &OpcionTerceros) -> Option<&'static str> {
    match opcion {
        OpcionTerceros::Ninguna => None,
        OpcionTerceros::Interna => Some("interno"),
        OpcionTerceros::Externa { .. } => Some("externo"),
        OpcionTerceros::Manuable { .. } => Some("manuable"),
    }
}

fn sin_id_asignado(entidad: &str) -> WizardError {
    WizardError::Api(ApiError::Api(format!(
        "el backend no asignó id al {entidad} creado"
    )))
}
