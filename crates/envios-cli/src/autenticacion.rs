//! Login/logout handlers over the session store.

use envios_api::ApiClient;
use envios_wizard::SessionStore;

pub async fn login(
    api: &mut ApiClient,
    store: &mut SessionStore,
    credential: &str,
    password: &str,
) -> anyhow::Result<()> {
    store.iniciar(api, credential, password).await?;
    let sesion = store
        .sesion()
        .ok_or_else(|| anyhow::anyhow!("la sesión no quedó registrada"))?;
    println!("sesión iniciada como {} ({})", sesion.username, sesion.role);
    Ok(())
}

pub async fn logout(api: &mut ApiClient, store: &mut SessionStore) -> anyhow::Result<()> {
    store.cerrar(api).await?;
    println!("sesión cerrada");
    Ok(())
}
