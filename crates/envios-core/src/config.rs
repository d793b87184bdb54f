use thiserror::Error;

use crate::app_config::{AppConfig, Environment, PoliticaDriftCp};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = require("ENVIOS_API_BASE_URL")?;
    let estafeta_proxy_url = lookup("ENVIOS_ESTAFETA_PROXY_URL").ok();
    let manuable_base_url = lookup("ENVIOS_MANUABLE_BASE_URL").ok();

    let env = parse_environment(&or_default("ENVIOS_ENV", "development"));
    let log_level = or_default("ENVIOS_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("ENVIOS_REQUEST_TIMEOUT_SECS", "30")?;
    let connect_timeout_secs = parse_u64("ENVIOS_CONNECT_TIMEOUT_SECS", "10")?;
    let max_retries = parse_u32("ENVIOS_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("ENVIOS_RETRY_BACKOFF_BASE_SECS", "2")?;
    let user_agent = or_default("ENVIOS_USER_AGENT", "envios/0.1 (centro-envios)");
    let session_path = PathBuf::from(or_default("ENVIOS_SESSION_PATH", "./.envios-session.json"));
    let politica_drift_cp = parse_politica(&or_default("ENVIOS_POLITICA_DRIFT_CP", "warn"))?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        estafeta_proxy_url,
        manuable_base_url,
        request_timeout_secs,
        connect_timeout_secs,
        max_retries,
        retry_backoff_base_secs,
        user_agent,
        session_path,
        politica_drift_cp,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parse the zip-drift policy. This one does not fall back silently: an
/// unrecognized value is a configuration mistake with price-integrity
/// consequences.
fn parse_politica(s: &str) -> Result<PoliticaDriftCp, ConfigError> {
    match s {
        "warn" => Ok(PoliticaDriftCp::Advertir),
        "block" => Ok(PoliticaDriftCp::Bloquear),
        otro => Err(ConfigError::InvalidEnvVar {
            var: "ENVIOS_POLITICA_DRIFT_CP".to_string(),
            reason: format!("expected \"warn\" or \"block\", got {otro:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("ENVIOS_API_BASE_URL", "https://api.centro-envios.test/");
        m
    }

    #[test]
    fn falla_sin_api_base_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "ENVIOS_API_BASE_URL"),
            "expected MissingEnvVar(ENVIOS_API_BASE_URL), got: {result:?}"
        );
    }

    #[test]
    fn valores_predeterminados() {
        let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_backoff_base_secs, 2);
        assert_eq!(cfg.politica_drift_cp, PoliticaDriftCp::Advertir);
        assert!(cfg.estafeta_proxy_url.is_none());
        assert!(cfg.manuable_base_url.is_none());
    }

    #[test]
    fn entorno_desconocido_cae_en_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn politica_block_se_reconoce() {
        let mut map = full_env();
        map.insert("ENVIOS_POLITICA_DRIFT_CP", "block");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.politica_drift_cp, PoliticaDriftCp::Bloquear);
    }

    #[test]
    fn politica_invalida_es_error() {
        let mut map = full_env();
        map.insert("ENVIOS_POLITICA_DRIFT_CP", "ignore");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ENVIOS_POLITICA_DRIFT_CP"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn timeout_invalido_es_error() {
        let mut map = full_env();
        map.insert("ENVIOS_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ENVIOS_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn overrides_se_respetan() {
        let mut map = full_env();
        map.insert("ENVIOS_MAX_RETRIES", "5");
        map.insert("ENVIOS_USER_AGENT", "custom-agent/2.0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.user_agent, "custom-agent/2.0");
    }
}
