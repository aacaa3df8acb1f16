//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Todo tiene un valor por
//! defecto salvo `JWT_SECRET` en producción.

use anyhow::{bail, Context, Result};
use std::env;

use crate::dto::common_dto::MAX_PAGE_SIZE;

const DEV_JWT_SECRET: &str = "workshop-dev-secret-change-me";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// None = almacenamiento en memoria
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub default_page_size: i64,
    pub log_level: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            cors_origins: Vec::new(),
            default_page_size: 20,
            log_level: "debug".to_string(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_production = environment == "production";

        let port = match var("PORT") {
            Some(p) => p.parse().context("PORT must be a valid number")?,
            None => defaults.port,
        };

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if is_production => bail!("JWT_SECRET must be set in production"),
            None => defaults.jwt_secret,
        };

        let default_page_size = match var("DEFAULT_PAGE_SIZE") {
            Some(size) => size
                .parse::<i64>()
                .context("DEFAULT_PAGE_SIZE must be a valid number")?
                .clamp(1, MAX_PAGE_SIZE),
            None => defaults.default_page_size,
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| {
            if is_production { "info" } else { "debug" }.to_string()
        });

        Ok(Self {
            environment,
            port,
            host: var("HOST").unwrap_or(defaults.host),
            database_url: var("DATABASE_URL"),
            jwt_secret,
            cors_origins,
            default_page_size,
            log_level,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Nivel para tracing-subscriber; valores desconocidos caen en INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert_eq!(config.default_page_size, 20);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_tracing_level_fallback() {
        let mut config = EnvironmentConfig::default();
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
        config.log_level = "nonsense".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }
}
