use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What to do when the customer/destination postal codes drift from the
/// codes the quote was priced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoliticaDriftCp {
    /// Record a warning on the confirmation but allow submission.
    Advertir,
    /// Refuse submission until the codes match again.
    Bloquear,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub api_base_url: String,
    pub estafeta_proxy_url: Option<String>,
    pub manuable_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub user_agent: String,
    pub session_path: PathBuf,
    pub politica_drift_cp: PoliticaDriftCp,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("estafeta_proxy_url", &self.estafeta_proxy_url)
            .field("manuable_base_url", &self.manuable_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("user_agent", &self.user_agent)
            .field("session_path", &self.session_path)
            .field("politica_drift_cp", &self.politica_drift_cp)
            .finish()
    }
}
