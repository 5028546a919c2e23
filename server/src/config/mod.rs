use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

use crate::auth::DEFAULT_SESSION_TTL_HOURS;

pub const SERVICE_NAME: &str = "gatherly";

const DEFAULT_DATABASE_URL: &str = "sqlite://gatherly.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub session_ttl_hours: u64,
    pub cors_allowed_origins: Vec<String>,
    pub is_production: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secret_key: DEV_SECRET_KEY.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            cors_allowed_origins: Vec::new(),
            is_production: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let is_production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("SECRET_KEY not set, using the development key");
            defaults.secret_key.clone()
        });

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("GATHERLY_HOST").unwrap_or(defaults.host),
            port: parse_or("GATHERLY_PORT", defaults.port),
            secret_key,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", defaults.session_ttl_hours),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),
            is_production,
            log_level: env::var("GATHERLY_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_local_sqlite_file() {
        let config = Config::default();
        assert!(config.database_url.starts_with("sqlite:"));
        assert_eq!(config.server_addr(), "0.0.0.0:5000");
        assert!(!config.is_production);
    }

    #[test]
    fn test_split_origins_skips_blanks() {
        assert_eq!(
            split_origins(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(split_origins("").is_empty());
    }
}
