//! Tracing Subscriber Initialization
//!
//! JSON-formatted structured logs filtered by `RUST_LOG`, falling back to
//! the configured filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON lines (default) or human-readable text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("WALLET_SERVICE_NAME")
                .unwrap_or_else(|_| "wallet-api".to_string()),
            service_version: std::env::var("WALLET_SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: std::env::var("WALLET_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_filter: std::env::var("WALLET_LOG_FILTER").unwrap_or_else(|_| {
                "wallet_api=debug,wallet_rotation=debug,tower_http=debug,info".to_string()
            }),
            json: std::env::var("WALLET_LOG_FORMAT")
                .map(|s| s.to_lowercase() != "text")
                .unwrap_or(true),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at startup before any tracing occurs.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        service_version = config.service_version,
        environment = config.environment,
        "Telemetry initialized"
    );

    Ok(())
}
