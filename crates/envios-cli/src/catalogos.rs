//! Catalog command handlers: clientes, destinos, envíos.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use envios_api::{ApiClient, Catalogo, ModoBusqueda};
use envios_carriers::{ManuableClient, SolicitudTarifas};
use envios_core::{AppConfig, Cliente, Descuento, Destino, Envio};
use envios_wizard::{
    EnvioSubmitter, OpcionTerceros, SessionStore, WizardController,
};

use crate::cotizar;

#[derive(Debug, Subcommand)]
pub enum ClientesCmd {
    /// Lista una página del catálogo
    Listar {
        #[arg(long, default_value_t = 1)]
        pagina: u32,
        #[arg(long, default_value_t = 20)]
        por_pagina: u32,
    },
    /// Búsqueda de texto libre
    Buscar {
        consulta: String,
        #[arg(long, default_value_t = 1)]
        pagina: u32,
        #[arg(long, default_value_t = 20)]
        por_pagina: u32,
    },
    /// Muestra un cliente
    Ver { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum DestinosCmd {
    /// Lista destinos, opcionalmente de un solo cliente
    Listar {
        #[arg(long)]
        cliente_id: Option<i64>,
        #[arg(long, default_value_t = 1)]
        pagina: u32,
        #[arg(long, default_value_t = 20)]
        por_pagina: u32,
    },
    /// Muestra un destino
    Ver { id: i64 },
    /// Elimina un destino; exige la frase `eliminar <id>`
    Eliminar {
        id: i64,
        #[arg(long)]
        confirmacion: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum EnviosCmd {
    /// Lista envíos, opcionalmente filtrados por estatus
    Listar {
        #[arg(long)]
        estatus: Option<String>,
        #[arg(long, default_value_t = 1)]
        pagina: u32,
        #[arg(long, default_value_t = 20)]
        por_pagina: u32,
    },
    /// Muestra un envío
    Ver { id: i64 },
    /// Corre el flujo completo: cotiza, confirma y crea el envío
    Crear(CrearEnvioArgs),
}

#[derive(Debug, Args)]
pub struct CrearEnvioArgs {
    #[command(flatten)]
    pub cotizacion: cotizar::CotizarArgs,
    /// Cliente existente que envía
    #[arg(long)]
    pub cliente_id: i64,
    /// Destino existente del cliente
    #[arg(long)]
    pub destino_id: i64,
    /// SKU del servicio elegido de la cotización
    #[arg(long)]
    pub sku: String,
    /// Descripción del contenido
    #[arg(long)]
    pub contenido: String,
    /// interno | externo | manuable
    #[arg(long, default_value = "interno")]
    pub metodo: String,
    #[arg(long)]
    pub paqueteria: Option<String>,
    #[arg(long)]
    pub numero_guia: Option<String>,
    /// Ruta del archivo de la etiqueta externa
    #[arg(long)]
    pub etiqueta: Option<PathBuf>,
    #[arg(long)]
    pub costo_neto: Option<Decimal>,
    /// Descuento fijo en pesos
    #[arg(long)]
    pub descuento: Option<Decimal>,
    /// Descuento porcentual (0-100)
    #[arg(long)]
    pub descuento_pct: Option<Decimal>,
}

pub async fn clientes(api: &ApiClient, command: ClientesCmd) -> anyhow::Result<()> {
    match command {
        ClientesCmd::Listar { pagina, por_pagina } => {
            let resultado = api
                .paginar::<Cliente>(Catalogo::Clientes, pagina, por_pagina)
                .await?;
            for cliente in &resultado.data {
                imprimir_cliente(cliente);
            }
            println!("total: {}", resultado.total);
        }
        ClientesCmd::Buscar {
            consulta,
            pagina,
            por_pagina,
        } => {
            let resultado = api
                .buscar::<Cliente>(Catalogo::Clientes, &consulta, pagina, por_pagina)
                .await?;
            for cliente in &resultado.data {
                imprimir_cliente(cliente);
            }
            println!("total: {}", resultado.total);
        }
        ClientesCmd::Ver { id } => {
            let cliente: Cliente = api.obtener(Catalogo::Clientes, id).await?;
            imprimir_cliente(&cliente);
        }
    }
    Ok(())
}

pub async fn destinos(api: &ApiClient, command: DestinosCmd) -> anyhow::Result<()> {
    match command {
        DestinosCmd::Listar {
            cliente_id,
            pagina,
            por_pagina,
        } => {
            let resultado = match cliente_id {
                Some(id) => {
                    let criterio = id.to_string();
                    api.busqueda_avanzada::<Destino>(
                        Catalogo::Destinos,
                        &[("cliente_id", criterio.as_str())],
                        ModoBusqueda::Todos,
                    )
                    .await?
                }
                None => {
                    api.paginar::<Destino>(Catalogo::Destinos, pagina, por_pagina)
                        .await?
                }
            };
            for destino in &resultado.data {
                imprimir_destino(destino);
            }
            println!("total: {}", resultado.total);
        }
        DestinosCmd::Ver { id } => {
            let destino: Destino = api.obtener(Catalogo::Destinos, id).await?;
            imprimir_destino(&destino);
        }
        DestinosCmd::Eliminar { id, confirmacion } => {
            api.eliminar_destino(id, &confirmacion).await?;
            println!("destino {id} eliminado");
        }
    }
    Ok(())
}

pub async fn envios(
    api: &ApiClient,
    config: &AppConfig,
    store: &mut SessionStore,
    command: EnviosCmd,
) -> anyhow::Result<()> {
    match command {
        EnviosCmd::Listar {
            estatus,
            pagina,
            por_pagina,
        } => {
            let resultado = match estatus {
                Some(estatus) => {
                    api.busqueda_avanzada::<Envio>(
                        Catalogo::Envios,
                        &[("estatus", estatus.as_str())],
                        ModoBusqueda::Todos,
                    )
                    .await?
                }
                None => api.paginar::<Envio>(Catalogo::Envios, pagina, por_pagina).await?,
            };
            for envio in &resultado.data {
                imprimir_envio(envio);
            }
            println!("total: {}", resultado.total);
        }
        EnviosCmd::Ver { id } => {
            let envio: Envio = api.obtener(Catalogo::Envios, id).await?;
            imprimir_envio(&envio);
        }
        EnviosCmd::Crear(args) => crear_envio(api, config, store, args).await?,
    }
    Ok(())
}

async fn crear_envio(
    api: &ApiClient,
    config: &AppConfig,
    store: &mut SessionStore,
    args: CrearEnvioArgs,
) -> anyhow::Result<()> {
    let cliente: Cliente = api.obtener(Catalogo::Clientes, args.cliente_id).await?;
    let destino: Destino = api.obtener(Catalogo::Destinos, args.destino_id).await?;

    let mut cotizador = cotizar::construir_cotizador(&args.cotizacion)?;
    if args.cotizacion.validar_ruta {
        cotizar::validar_ruta(config, &mut cotizador).await?;
    }

    let mut wizard = WizardController::new(cotizador, config.politica_drift_cp);
    wizard.cotizador_mut().cotizar(api).await?;
    wizard.cotizador_mut().seleccionar(&args.sku)?;
    wizard.continuar_a_datos()?;

    wizard.seleccionar_cliente(cliente);
    wizard.seleccionar_destino(destino);

    // Refresh the lookup-derived address fields on both records. The two
    // lookups run concurrently and write disjoint slices; a failed lookup
    // clears its side instead of leaving stale autofill behind.
    let cp_cliente = wizard
        .cliente()
        .map(|t| t.current().direccion.codigo_postal.clone())
        .unwrap_or_default();
    let cp_destino = wizard
        .destino()
        .map(|t| t.current().direccion.codigo_postal.clone())
        .unwrap_or_default();
    let (lookup_cliente, lookup_destino) =
        envios_wizard::buscar_codigos(api, &cp_cliente, &cp_destino).await;
    match lookup_cliente {
        Ok(direccion) => wizard.autocompletar_cliente(&direccion),
        Err(e) => {
            tracing::warn!(cp = %cp_cliente, error = %e, "customer postal lookup failed");
            wizard.limpiar_autofill_cliente();
        }
    }
    match lookup_destino {
        Ok(direccion) => wizard.autocompletar_destino(&direccion),
        Err(e) => {
            tracing::warn!(cp = %cp_destino, error = %e, "destination postal lookup failed");
            wizard.limpiar_autofill_destino();
        }
    }

    wizard.set_contenido(&args.contenido);
    wizard.continuar_a_confirmacion()?;

    if let Some(pct) = args.descuento_pct {
        wizard.set_descuento(Some(Descuento::Porcentaje { valor: pct }));
    } else if let Some(monto) = args.descuento {
        wizard.set_descuento(Some(Descuento::Monto { valor: monto }));
    }

    let manuable = construir_manuable(config, &args)?;
    let opcion = construir_opcion(&args, manuable.as_ref()).await?;
    wizard.elegir_opcion(opcion);

    if let Some(advertencia) = wizard.advertencia_drift() {
        println!("advertencia: {advertencia}");
    }

    let mut submitter = EnvioSubmitter::new(api)
        .con_reintentos(config.max_retries, config.retry_backoff_base_secs);
    if let Some(m) = manuable.as_ref() {
        submitter = submitter.con_manuable(m);
    }
    let resultado = submitter.enviar(&mut wizard, Some(store)).await?;

    for advertencia in &resultado.advertencias {
        println!("advertencia: {advertencia}");
    }
    let envio = &resultado.envio;
    println!(
        "envío creado: id {} / servicio {} / total {}",
        envio.id.map_or_else(|| "?".to_owned(), |id| id.to_string()),
        envio.servicio,
        envio.costos.total
    );
    Ok(())
}

fn construir_manuable(
    config: &AppConfig,
    args: &CrearEnvioArgs,
) -> anyhow::Result<Option<ManuableClient>> {
    if args.metodo != "manuable" {
        return Ok(None);
    }
    let base_url = config
        .manuable_base_url
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("configura ENVIOS_MANUABLE_BASE_URL para usar Manuable"))?;
    Ok(Some(ManuableClient::new(
        base_url,
        config.request_timeout_secs,
    )?))
}

async fn construir_opcion(
    args: &CrearEnvioArgs,
    manuable: Option<&ManuableClient>,
) -> anyhow::Result<OpcionTerceros> {
    match args.metodo.as_str() {
        "interno" => Ok(OpcionTerceros::Interna),
        "externo" => {
            let paqueteria = args
                .paqueteria
                .clone()
                .ok_or_else(|| anyhow::anyhow!("el método externo requiere --paqueteria"))?;
            let numero_guia = args
                .numero_guia
                .clone()
                .ok_or_else(|| anyhow::anyhow!("el método externo requiere --numero-guia"))?;
            let ruta_etiqueta = args
                .etiqueta
                .clone()
                .ok_or_else(|| anyhow::anyhow!("el método externo requiere --etiqueta"))?;
            let costo_neto = args
                .costo_neto
                .ok_or_else(|| anyhow::anyhow!("el método externo requiere --costo-neto"))?;
            let contenido = std::fs::read(&ruta_etiqueta)?;
            let nombre = ruta_etiqueta
                .file_name()
                .map_or_else(|| "etiqueta.pdf".to_owned(), |n| n.to_string_lossy().into_owned());
            Ok(OpcionTerceros::Externa {
                paqueteria,
                numero_guia,
                etiqueta: envios_api::ArchivoEtiqueta { nombre, contenido },
                costo_neto,
            })
        }
        "manuable" => {
            let manuable =
                manuable.ok_or_else(|| anyhow::anyhow!("cliente de Manuable no configurado"))?;
            let (origen, destino) = match (&args.cotizacion.origen, &args.cotizacion.destino) {
                (Some(o), Some(d)) => (o.clone(), d.clone()),
                _ => anyhow::bail!("Manuable requiere --origen y --destino"),
            };
            let tarifas = manuable
                .obtener_tarifas(&SolicitudTarifas {
                    codigo_postal_origen: origen,
                    codigo_postal_destino: destino,
                    peso: args.cotizacion.peso,
                    largo: args.cotizacion.largo,
                    ancho: args.cotizacion.ancho,
                    alto: args.cotizacion.alto,
                })
                .await?;
            let tarifa = tarifas
                .into_iter()
                .min_by_key(|t| t.total)
                .ok_or_else(|| anyhow::anyhow!("Manuable no devolvió tarifas para la ruta"))?;
            println!(
                "tarifa Manuable: {} / {} / {}",
                tarifa.paqueteria, tarifa.servicio, tarifa.total
            );
            Ok(OpcionTerceros::Manuable {
                tarifa,
                etiqueta: None,
            })
        }
        otro => anyhow::bail!("método de creación desconocido: {otro}"),
    }
}

fn imprimir_cliente(cliente: &Cliente) {
    println!(
        "[{}] {} / tel {} / CP {} {}",
        cliente.id.map_or_else(|| "-".to_owned(), |id| id.to_string()),
        cliente.nombre,
        cliente.telefono,
        cliente.direccion.codigo_postal,
        cliente.direccion.colonia
    );
}

fn imprimir_destino(destino: &Destino) {
    println!(
        "[{}] {} / cliente {} / CP {} {}",
        destino.id.map_or_else(|| "-".to_owned(), |id| id.to_string()),
        destino.nombre,
        destino
            .cliente_id
            .map_or_else(|| "-".to_owned(), |id| id.to_string()),
        destino.direccion.codigo_postal,
        destino.direccion.colonia
    );
}

fn imprimir_envio(envio: &Envio) {
    println!(
        "[{}] {} / {} / {} / total {}",
        envio.id.map_or_else(|| "-".to_owned(), |id| id.to_string()),
        envio.servicio,
        envio.estatus,
        envio.metodo.clave(),
        envio.costos.total
    );
}
