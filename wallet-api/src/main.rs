//! Wallet API Server Entry Point
//!
//! Bootstraps configuration, picks the storage backend, seeds the payment
//! identifier pool, starts the daily growth job and serves the Axum router.

use std::net::SocketAddr;

use tokio::sync::watch;
use wallet_api::constants::{DEFAULT_BIND_HOST, DEFAULT_PORT};
use wallet_api::jobs::{daily_growth_task, DailyGrowthConfig};
use wallet_api::telemetry::{init_tracing, TelemetryConfig};
use wallet_api::{
    create_api_router, wallet_config_from_env, ApiConfig, ApiError, ApiResult, AppState,
    AuthConfig, DbClient, DbConfig, PoolSeedConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let auth_config = AuthConfig::from_env();
    auth_config.check_deployment()?;

    let wallet_config = wallet_config_from_env();
    wallet_config.validate()?;

    let api_config = ApiConfig::from_env();
    let state = build_state(auth_config, wallet_config).await?;
    seed_pool(&state, &PoolSeedConfig::from_env()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let growth = tokio::spawn(daily_growth_task(
        state.ledger.clone(),
        DailyGrowthConfig::from_env(),
        shutdown_rx,
    ));

    let app = create_api_router(state, &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting wallet API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = growth.await {
        tracing::warn!(error = %e, "Daily growth task did not stop cleanly");
    }
    Ok(())
}

/// PostgreSQL unless `WALLET_STORAGE=memory`.
async fn build_state(
    auth_config: AuthConfig,
    wallet_config: wallet_core::WalletConfig,
) -> ApiResult<AppState> {
    let storage = std::env::var("WALLET_STORAGE")
        .unwrap_or_else(|_| "postgres".to_string())
        .to_lowercase();

    if storage == "memory" {
        tracing::warn!("Using in-memory storage; all data is lost on restart");
        return Ok(AppState::in_memory(auth_config, wallet_config));
    }

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    db.apply_schema().await?;
    tracing::info!(
        host = %db_config.host,
        dbname = %db_config.dbname,
        pool_size = db.pool_size(),
        "Connected to PostgreSQL"
    );
    Ok(AppState::with_database(db, auth_config, wallet_config))
}

/// Add the configured handles when the pool is empty.
async fn seed_pool(state: &AppState, seed: &PoolSeedConfig) -> ApiResult<()> {
    if seed.handles.is_empty() {
        return Ok(());
    }
    if !state.engine.list_identifiers().await?.is_empty() {
        tracing::debug!("Payment identifier pool already populated, skipping seed");
        return Ok(());
    }
    for handle in &seed.handles {
        state.engine.add_identifier(handle, None).await?;
    }
    let active = state.engine.get_active_or_bootstrap().await?;
    tracing::info!(
        count = seed.handles.len(),
        active = %active.handle,
        "Seeded payment identifier pool"
    );
    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("WALLET_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("WALLET_API_PORT").ok())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
