//! The session store: single source of truth for the locally cached auth
//! session.
//!
//! The server is authoritative; the JSON file at `session_path` is a
//! read-through cache. Two ~5 s grace windows smooth over the login/logout
//! boundaries: a session observed right after a login redirect is not
//! reported unauthenticated, and one observed right after a logout is not
//! reported authenticated, even if the caches have not converged yet.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envios_api::ApiClient;

use crate::error::WizardError;

const GRACIA_SEGUNDOS: i64 = 5;

/// The cached session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SesionLocal {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub expira: Option<DateTime<Utc>>,
    /// Stamped when a login redirect lands, opening the grace window that
    /// suppresses false-negative auth checks.
    #[serde(default)]
    pub redirigido_en: Option<DateTime<Utc>>,
    /// Stamped at logout, opening the grace window that suppresses
    /// false-positive auth checks.
    #[serde(default)]
    pub cerrado_en: Option<DateTime<Utc>>,
    /// Transient quotation-session marker bridging the quote and
    /// shipment-creation flows.
    #[serde(default)]
    pub cotizacion_id: Option<String>,
}

impl SesionLocal {
    /// Whether the session counts as authenticated at `ahora`.
    #[must_use]
    pub fn vigente(&self, ahora: DateTime<Utc>) -> bool {
        let en_gracia = |marca: Option<DateTime<Utc>>| {
            marca.is_some_and(|t| (ahora - t).num_seconds() < GRACIA_SEGUNDOS)
        };
        if en_gracia(self.cerrado_en) {
            return false;
        }
        if self.token.is_none() {
            return false;
        }
        match self.expira {
            Some(expira) if ahora >= expira => en_gracia(self.redirigido_en),
            _ => true,
        }
    }
}

/// Disk-backed session store with an in-memory copy.
pub struct SessionStore {
    path: PathBuf,
    estado: Option<SesionLocal>,
}

impl SessionStore {
    /// Opens the store, reading the cache file when it exists. A corrupt
    /// cache is discarded with a warning rather than failing the session.
    ///
    /// # Errors
    ///
    /// [`WizardError::Io`] on filesystem failures other than a missing file.
    pub fn abrir(path: &Path) -> Result<Self, WizardError> {
        let mut store = Self {
            path: path.to_path_buf(),
            estado: None,
        };
        store.refresh()?;
        Ok(store)
    }

    /// Re-reads the disk cache, dropping whatever is in memory.
    ///
    /// # Errors
    ///
    /// [`WizardError::Io`] on filesystem failures other than a missing file.
    pub fn refresh(&mut self) -> Result<(), WizardError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contenido) => match serde_json::from_str(&contenido) {
                Ok(sesion) => self.estado = Some(sesion),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "session cache corrupt — discarding");
                    self.estado = None;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.estado = None,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Clears the session from memory and disk.
    ///
    /// # Errors
    ///
    /// [`WizardError::Io`] if the cache file cannot be removed.
    pub fn invalidate(&mut self) -> Result<(), WizardError> {
        self.estado = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn sesion(&self) -> Option<&SesionLocal> {
        self.estado.as_ref()
    }

    /// Whether the cached session counts as authenticated at `ahora`.
    #[must_use]
    pub fn vigente(&self, ahora: DateTime<Utc>) -> bool {
        self.estado.as_ref().is_some_and(|s| s.vigente(ahora))
    }

    /// Logs in, persists the returned session and installs the token on the
    /// client.
    ///
    /// # Errors
    ///
    /// [`WizardError::Api`] on rejected credentials or transport failures;
    /// [`WizardError::Io`] if the cache cannot be written.
    pub async fn iniciar(
        &mut self,
        api: &mut ApiClient,
        credential: &str,
        password: &str,
    ) -> Result<(), WizardError> {
        let sesion = api.login(credential, password).await?;
        api.set_token(Some(sesion.token.clone()));
        let ahora = Utc::now();
        self.estado = Some(SesionLocal {
            token: Some(sesion.token),
            role: sesion.user.role,
            username: sesion.user.username,
            user_id: Some(sesion.user.id),
            expira: Some(ahora + chrono::Duration::hours(8)),
            redirigido_en: Some(ahora),
            cerrado_en: None,
            cotizacion_id: None,
        });
        self.persistir()
    }

    /// Logs out server-side and clears the local cache. The server call is
    /// best-effort: the local cache is cleared even when it fails, leaving
    /// only the logout timestamp behind for the grace window.
    ///
    /// # Errors
    ///
    /// [`WizardError::Io`] if the cache cannot be rewritten.
    pub async fn cerrar(&mut self, api: &mut ApiClient) -> Result<(), WizardError> {
        if let Err(e) = api.logout().await {
            tracing::warn!(error = %e, "logout request failed — clearing local session anyway");
        }
        api.set_token(None);
        self.estado = Some(SesionLocal {
            token: None,
            role: String::new(),
            username: String::new(),
            user_id: None,
            expira: None,
            redirigido_en: None,
            cerrado_en: Some(Utc::now()),
            cotizacion_id: None,
        });
        self.persistir()
    }

    pub fn cotizacion_id(&self) -> Option<&str> {
        self.estado.as_ref()?.cotizacion_id.as_deref()
    }

    /// Records the transient quotation-session marker.
    ///
    /// # Errors
    ///
    /// [`WizardError::Io`] if the cache cannot be written.
    pub fn set_cotizacion_id(&mut self, id: Option<String>) -> Result<(), WizardError> {
        if let Some(sesion) = &mut self.estado {
            sesion.cotizacion_id = id;
            return self.persistir();
        }
        Ok(())
    }

    fn persistir(&self) -> Result<(), WizardError> {
        let Some(sesion) = &self.estado else {
            return Ok(());
        };
        let contenido = serde_json::to_string_pretty(sesion)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, contenido)?;
        Ok(())
    }
}

/// Background watcher: polls the store every `periodo` (30 s in the
/// console) and fires `al_expirar` once when a previously authenticated
/// session is observed unauthenticated. This is the only recurring task in
/// the system.
pub fn vigilar(
    store: Arc<Mutex<SessionStore>>,
    periodo: Duration,
    al_expirar: impl Fn() + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut intervalo = tokio::time::interval(periodo);
        intervalo.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut autenticado_antes = false;
        loop {
            intervalo.tick().await;
            let vigente = {
                let Ok(mut guard) = store.lock() else { break };
                if let Err(e) = guard.refresh() {
                    tracing::warn!(error = %e, "session watcher: cache refresh failed");
                }
                guard.vigente(Utc::now())
            };
            if autenticado_antes && !vigente {
                tracing::info!("session lapsed — redirecting to login");
                al_expirar();
                break;
            }
            autenticado_antes = vigente;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sesion_con_token() -> SesionLocal {
        SesionLocal {
            token: Some("tok".to_owned()),
            role: "admin".to_owned(),
            username: "operador".to_owned(),
            user_id: Some(1),
            expira: None,
            redirigido_en: None,
            cerrado_en: None,
            cotizacion_id: None,
        }
    }

    #[test]
    fn sesion_con_token_sin_expirar_es_vigente() {
        assert!(sesion_con_token().vigente(Utc::now()));
    }

    #[test]
    fn sesion_sin_token_no_es_vigente() {
        let mut s = sesion_con_token();
        s.token = None;
        assert!(!s.vigente(Utc::now()));
    }

    #[test]
    fn sesion_expirada_no_es_vigente() {
        let ahora = Utc::now();
        let mut s = sesion_con_token();
        s.expira = Some(ahora - chrono::Duration::minutes(1));
        assert!(!s.vigente(ahora));
    }

    #[test]
    fn la_gracia_de_redireccion_cubre_una_expiracion_reciente() {
        let ahora = Utc::now();
        let mut s = sesion_con_token();
        s.expira = Some(ahora - chrono::Duration::seconds(1));
        s.redirigido_en = Some(ahora - chrono::Duration::seconds(2));
        assert!(s.vigente(ahora), "redirect grace must mask the stale expiry");

        s.redirigido_en = Some(ahora - chrono::Duration::seconds(30));
        assert!(!s.vigente(ahora), "grace window is ~5s only");
    }

    #[test]
    fn la_gracia_de_logout_gana_sobre_el_token() {
        let ahora = Utc::now();
        let mut s = sesion_con_token();
        s.cerrado_en = Some(ahora - chrono::Duration::seconds(2));
        assert!(!s.vigente(ahora), "a just-logged-out session is never authenticated");
    }

    #[test]
    fn abrir_y_persistir_redondean_por_disco() {
        let path = std::env::temp_dir().join(format!(
            "envios-sesion-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = SessionStore::abrir(&path).unwrap();
        assert!(store.sesion().is_none());

        store.estado = Some(sesion_con_token());
        store.persistir().unwrap();
        store.set_cotizacion_id(Some("cot-55".to_owned())).unwrap();

        let mut reabierto = SessionStore::abrir(&path).unwrap();
        assert_eq!(reabierto.cotizacion_id(), Some("cot-55"));
        assert!(reabierto.vigente(Utc::now()));

        reabierto.invalidate().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn el_vigilante_detecta_la_sesion_caida() {
        let path = std::env::temp_dir().join(format!(
            "envios-sesion-vigilada-{}.json",
            std::process::id()
        ));
        let mut store = SessionStore::abrir(&path).unwrap();
        store.estado = Some(sesion_con_token());
        store.persistir().unwrap();

        let store = Arc::new(Mutex::new(store));
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = vigilar(Arc::clone(&store), Duration::from_millis(10), move || {
            let _ = tx.send(());
        });

        // First tick observes the authenticated session; then the cache
        // disappears out from under the watcher.
        tokio::time::sleep(Duration::from_millis(25)).await;
        std::fs::remove_file(&path).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("watcher should fire and finish")
            .expect("watcher task should not panic");
        rx.try_recv().expect("expiry callback should have fired");
    }

    #[test]
    fn cache_corrupto_se_descarta_sin_fallar() {
        let path = std::env::temp_dir().join(format!(
            "envios-sesion-corrupta-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let store = SessionStore::abrir(&path).unwrap();
        assert!(store.sesion().is_none());
        let _ = std::fs::remove_file(&path);
    }
}
