use gateway_service::{
    build_router,
    config::{GatewayConfig, StoreBackend},
    db::{create_pool, run_migrations},
    services::{
        GoogleIdentityProvider, InMemoryAuditSink, InMemoryFacilityStore, InMemorySessionStore,
        InMemoryUserDirectory, Database,
    },
    AppState, Stores,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

async fn connect_stores(config: &GatewayConfig) -> Result<Stores, AppError> {
    let identity_provider = Arc::new(GoogleIdentityProvider::new(config.google.clone()));

    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; state is lost on restart");
            let facilities = if config.seed_demo_facilities {
                tracing::info!("Seeding demo facilities");
                InMemoryFacilityStore::with_demo_facilities()
            } else {
                InMemoryFacilityStore::new()
            };
            Ok(Stores {
                directory: Arc::new(InMemoryUserDirectory::new()),
                sessions: Arc::new(InMemorySessionStore::new()),
                facilities: Arc::new(facilities),
                audit: Arc::new(InMemoryAuditSink::new()),
                identity_provider,
                db: None,
            })
        }
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
            run_migrations(&pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
            tracing::info!("Database initialized successfully");

            let db = Database::new(pool);
            Ok(Stores {
                directory: Arc::new(db.clone()),
                sessions: Arc::new(db.clone()),
                facilities: Arc::new(db.clone()),
                audit: Arc::new(db.clone()),
                identity_provider,
                db: Some(db),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = GatewayConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    gateway_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        store_backend = ?config.store_backend,
        "Starting authorization gateway"
    );

    let stores = connect_stores(&config).await?;
    let state = AppState::new(config.clone(), stores);
    let app = build_router(state);

    let addr = config.common.socket_addr()?;

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(config.common.shutdown_grace_seconds))
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal(grace_seconds: u64) {
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
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(grace_seconds)).await;
}
