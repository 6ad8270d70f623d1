//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::OperationsStore;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub store: Arc<dyn OperationsStore>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, store: Arc<dyn OperationsStore>) -> Self {
        Self {
            jwt: JwtConfig::from(&config),
            config,
            store,
        }
    }
}
