//! Configuración de base de datos
//!
//! Este módulo maneja la conexión y configuración de PostgreSQL con SQLx.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Configuración de la base de datos
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    /// Leer la configuración desde `DATABASE_URL` y `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS must be a valid number")?
            .unwrap_or(20);

        Ok(Self {
            url,
            max_connections,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        })
    }

    /// Crear un nuevo pool de conexiones
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}
