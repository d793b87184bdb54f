use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use envios_api::ApiClient;
use envios_core::load_app_config;
use envios_wizard::SessionStore;

mod autenticacion;
mod catalogos;
mod cotizar;
mod zona;

#[derive(Debug, Parser)]
#[command(name = "envios-cli")]
#[command(about = "Centro de Envíos — consola de cotización y envíos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inicia sesión y guarda el token en la caché local
    Login {
        #[arg(long)]
        credential: String,
        #[arg(long)]
        password: String,
    },
    /// Cierra la sesión y limpia la caché local
    Logout,
    /// Consulta dirección y frecuencia de entrega de un código postal
    Zona { codigo_postal: String },
    /// Solicita una cotización multi-paquetería
    Cotizar(cotizar::CotizarArgs),
    /// Catálogo de clientes
    Clientes {
        #[command(subcommand)]
        command: catalogos::ClientesCmd,
    },
    /// Catálogo de destinos
    Destinos {
        #[command(subcommand)]
        command: catalogos::DestinosCmd,
    },
    /// Catálogo y creación de envíos
    Envios {
        #[command(subcommand)]
        command: catalogos::EnviosCmd,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let mut api = ApiClient::new(&config)?;
    let mut store = SessionStore::abrir(&config.session_path)?;
    if let Some(token) = store.sesion().and_then(|s| s.token.clone()) {
        api.set_token(Some(token));
    }

    match cli.command {
        Commands::Login {
            credential,
            password,
        } => autenticacion::login(&mut api, &mut store, &credential, &password).await,
        Commands::Logout => autenticacion::logout(&mut api, &mut store).await,
        Commands::Zona { codigo_postal } => zona::consultar(&api, &codigo_postal).await,
        Commands::Cotizar(args) => cotizar::ejecutar(&api, &config, args).await,
        Commands::Clientes { command } => catalogos::clientes(&api, command).await,
        Commands::Destinos { command } => catalogos::destinos(&api, command).await,
        Commands::Envios { command } => {
            catalogos::envios(&api, &config, &mut store, command).await
        }
    }
}
