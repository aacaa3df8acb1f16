use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use workshop_erp::config::database::DatabaseConfig;
use workshop_erp::config::environment::EnvironmentConfig;
use workshop_erp::database::DatabaseConnection;
use workshop_erp::repositories::Repositories;
use workshop_erp::routes::create_router;
use workshop_erp::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    info!("🔧 Workshop ERP - API de gestión de oficina");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    // Inicializar almacenamiento
    let repos = match &config.database_url {
        Some(url) => {
            let db = match DatabaseConnection::connect(&DatabaseConfig::new(url.clone())).await {
                Ok(db) => db,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };
            db.ensure_schema().await?;
            Repositories::postgres(db.pool().clone())
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida: usando almacenamiento en memoria (los datos se pierden al reiniciar)");
            Repositories::in_memory()
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(config, repos));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   /api/clients, /api/vehicles, /api/parts, /api/services");
    info!("   /api/work-orders, /api/ledger");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
