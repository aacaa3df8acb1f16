//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repos: Repositories,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, repos: Repositories) -> Self {
        Self { config, repos }
    }
}
