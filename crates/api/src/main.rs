use std::sync::Arc;

use aerosentinel_api::{app, config, middleware};
use anyhow::Result;
use domain::services::{ZoneRegistry, ZoneStore};
use persistence::{MemoryZoneStore, PgZoneStore};
use sqlx::PgPool;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting AeroSentinel zone service v{}", env!("CARGO_PKG_VERSION"));

    let (store, pool) = open_store(&config).await?;
    let registry = ZoneRegistry::new(store);

    let app = app::create_app(config.clone(), registry.clone(), pool);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown();
    info!("Server stopped");

    Ok(())
}

async fn open_store(config: &config::Config) -> Result<(Arc<dyn ZoneStore>, Option<PgPool>)> {
    let buffer = config.realtime.change_buffer;
    match config.store.backend {
        config::StoreBackend::Memory => {
            info!("Using in-memory zone store");
            Ok((Arc::new(MemoryZoneStore::new(buffer)), None))
        }
        config::StoreBackend::Postgres => {
            let pool = persistence::db::create_pool(&(&config.database).into()).await?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            let store = PgZoneStore::new(pool.clone(), &config.realtime.notify_channel, buffer);
            Ok((Arc::new(store), Some(pool)))
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
