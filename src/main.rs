use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rental_ops::config::database::DatabaseConfig;
use rental_ops::config::environment::{EnvironmentConfig, StorageBackend};
use rental_ops::database;
use rental_ops::repositories::{BookingRepository, InMemoryOperationsStore, OperationsStore};
use rental_ops::routes::create_router;
use rental_ops::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Rental Ops - Back office de reservas");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    if config.is_development() && config.cors_origins.is_empty() {
        info!("🛠️ Modo desarrollo: CORS permisivo");
    }

    let store: Arc<dyn OperationsStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = match database::connect(&db_config).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(e);
                }
            };
            Arc::new(BookingRepository::new(pool))
        }
        StorageBackend::Memory => {
            info!("🧪 Usando almacén en memoria (los datos no se conservan)");
            Arc::new(InMemoryOperationsStore::new())
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(config, store));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("📋 Endpoints - Bookings (requieren token de personal):");
    info!("   GET  /api/bookings/:id - Obtener reserva");
    info!("   GET  /api/bookings/:id/operations - Checklist de operaciones");
    info!("   POST /api/bookings/:id/status - Cambiar estado");
    info!("   POST /api/bookings/:id/activate - Activar alquiler");
    info!("   POST /api/bookings/:id/cancel - Cancelar reserva");
    info!("   POST /api/bookings/:id/advance - Avanzar al siguiente estado");
    info!("   GET  /api/bookings/:id/status-history - Historial de estados");
    info!("   GET  /api/bookings/:id/return - Estado de la devolución");
    info!("   POST /api/bookings/:id/return/advance - Avanzar devolución");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
