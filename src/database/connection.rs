//! Configuración de conexión a PostgreSQL
//!
//! Este módulo abre el pool de conexiones y aplica las migraciones.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::config::database::DatabaseConfig;

/// Crear el pool de conexiones y aplicar migraciones pendientes
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    info!("🗄️ Conectando a {}", mask_database_url(&config.url));
    let pool = config.create_pool().await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("✅ Migraciones aplicadas");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
