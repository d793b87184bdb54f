//! Quote command: builds the quote from flags, optionally validates the
//! route with Estafeta, and prints the candidate services.

use clap::Args;
use rust_decimal::Decimal;

use envios_api::ApiClient;
use envios_carriers::EstafetaProxy;
use envios_core::{AppConfig, OpcionEmpaque, TipoPaquete};
use envios_wizard::{Cotizador, ParametrosPaquete, RutaCotizacion};

#[derive(Debug, Args)]
pub struct CotizarArgs {
    /// Tipo de paquete: paquete | sobre
    #[arg(long, default_value = "paquete")]
    pub tipo: String,
    /// Largo en cm (solo paquete)
    #[arg(long)]
    pub largo: Option<f64>,
    /// Ancho en cm (solo paquete)
    #[arg(long)]
    pub ancho: Option<f64>,
    /// Alto en cm (solo paquete)
    #[arg(long)]
    pub alto: Option<f64>,
    /// Peso en kg
    #[arg(long)]
    pub peso: f64,
    /// Valor declarado para el seguro
    #[arg(long)]
    pub valor_seguro: Option<Decimal>,
    /// Opción de empaque EMP00..EMP05
    #[arg(long, default_value = "EMP00")]
    pub empaque: String,
    /// Precio del empaque propio (requerido con EMP05)
    #[arg(long)]
    pub precio_empaque: Option<Decimal>,
    /// Requiere recolección a domicilio
    #[arg(long)]
    pub recoleccion: bool,
    #[arg(long)]
    pub precio_recoleccion: Option<Decimal>,
    /// Envío internacional (usa --zona en lugar de códigos postales)
    #[arg(long)]
    pub internacional: bool,
    /// Zona de destino internacional (1-5)
    #[arg(long)]
    pub zona: Option<u8>,
    /// Código postal de origen (nacional)
    #[arg(long)]
    pub origen: Option<String>,
    /// Código postal de destino (nacional)
    #[arg(long)]
    pub destino: Option<String>,
    /// Valida la ruta con Estafeta para derivar la reexpedición
    #[arg(long)]
    pub validar_ruta: bool,
}

pub fn construir_cotizador(args: &CotizarArgs) -> anyhow::Result<Cotizador> {
    let tipo = match args.tipo.to_lowercase().as_str() {
        "sobre" => TipoPaquete::Sobre,
        "paquete" => {
            let (Some(largo), Some(ancho), Some(alto)) = (args.largo, args.ancho, args.alto)
            else {
                anyhow::bail!("un paquete requiere --largo, --ancho y --alto");
            };
            TipoPaquete::Paquete { largo, ancho, alto }
        }
        otro => anyhow::bail!("tipo de paquete desconocido: {otro}"),
    };

    let empaque = match args.empaque.to_uppercase().as_str() {
        "EMP00" => OpcionEmpaque::Emp00,
        "EMP01" => OpcionEmpaque::Emp01,
        "EMP02" => OpcionEmpaque::Emp02,
        "EMP03" => OpcionEmpaque::Emp03,
        "EMP04" => OpcionEmpaque::Emp04,
        "EMP05" => {
            let precio = args
                .precio_empaque
                .ok_or_else(|| anyhow::anyhow!("EMP05 requiere --precio-empaque"))?;
            OpcionEmpaque::Emp05 { precio }
        }
        otro => anyhow::bail!("opción de empaque desconocida: {otro}"),
    };

    let ruta = if args.internacional {
        RutaCotizacion::Internacional { zona: args.zona }
    } else {
        let (Some(origen), Some(destino)) = (args.origen.clone(), args.destino.clone()) else {
            anyhow::bail!("un envío nacional requiere --origen y --destino");
        };
        RutaCotizacion::Nacional { origen, destino }
    };

    let cotizador = Cotizador::new(
        ParametrosPaquete {
            tipo,
            peso: args.peso,
            valor_seguro: args.valor_seguro,
            empaque,
            requiere_recoleccion: args.recoleccion,
            precio_recoleccion: args.precio_recoleccion,
        },
        ruta,
    )?;
    Ok(cotizador)
}

/// Runs the Estafeta validation when requested and feeds the derived
/// reexpedition flag into the quote. Validation failures degrade to "no
/// reexpedition" with a warning; the quote still runs.
pub async fn validar_ruta(
    config: &AppConfig,
    cotizador: &mut Cotizador,
) -> anyhow::Result<()> {
    let RutaCotizacion::Nacional { origen, destino } = cotizador.ruta().clone() else {
        return Ok(());
    };
    let Some(proxy_url) = &config.estafeta_proxy_url else {
        anyhow::bail!("configura ENVIOS_ESTAFETA_PROXY_URL para validar la ruta");
    };
    let proxy = EstafetaProxy::new(proxy_url, config.request_timeout_secs)?;
    match proxy.validar(&origen, &destino).await {
        Ok(validacion) => {
            cotizador.set_reexpedicion(validacion.requiere_reexpedicion());
            if validacion.ocurre_forzoso {
                println!("ocurre forzoso: el paquete se recoge en sucursal");
            }
            if let Some(dias) = &validacion.estafeta_delivery_days {
                println!("días de entrega estimados (Estafeta): {dias}");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "estafeta validation failed — quoting without reexpedition");
        }
    }
    Ok(())
}

pub async fn ejecutar(
    api: &ApiClient,
    config: &AppConfig,
    args: CotizarArgs,
) -> anyhow::Result<()> {
    let mut cotizador = construir_cotizador(&args)?;
    if args.validar_ruta {
        validar_ruta(config, &mut cotizador).await?;
    }

    let resultado = cotizador.cotizar(api).await?;

    println!("{:<8} {:<32} {:>5} {:>12} {:>12}", "SKU", "Servicio", "Días", "Base", "Con IVA");
    for servicio in &resultado.servicios {
        println!(
            "{:<8} {:<32} {:>5} {:>12} {:>12}",
            servicio.sku,
            servicio.nombre,
            servicio.dias_estimados,
            servicio.precio_base,
            servicio.precio_con_iva
        );
    }
    let cargos = &resultado.cargos;
    if cargos.suma() > Decimal::ZERO {
        println!(
            "cargos: empaque {} / seguro {} / recolección {} / reexpedición {}",
            cargos.empaque, cargos.seguro, cargos.recoleccion, cargos.reexpedicion
        );
    }
    println!("peso facturable: {} kg", resultado.peso_facturable);
    println!("total: {}", resultado.gran_total);
    Ok(())
}
