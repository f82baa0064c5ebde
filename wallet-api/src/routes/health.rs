//! Health Probes
//!
//! Public endpoints for load balancers and orchestrators. Readiness checks
//! the storage backend and whether the payment identifier pool can take
//! recharges.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::DbClient;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Probe outcome. `Degraded` still serves traffic but recharges will be
/// refused until an identifier is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LivenessReport {
    pub status: ProbeStatus,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StorageProbe {
    pub status: ProbeStatus,
    /// "postgres" or "memory"
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_trip_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PoolProbe {
    pub status: ProbeStatus,
    pub identifiers: i64,
    pub has_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub status: ProbeStatus,
    pub storage: StorageProbe,
    /// Absent when storage is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolProbe>,
    pub version: String,
    pub uptime_seconds: u64,
}

impl ReadinessReport {
    /// Worst of the component statuses.
    fn overall(storage: &StorageProbe, pool: Option<&PoolProbe>) -> ProbeStatus {
        match (storage.status, pool.map(|p| p.status)) {
            (ProbeStatus::Down, _) | (_, None) | (_, Some(ProbeStatus::Down)) => ProbeStatus::Down,
            (_, Some(ProbeStatus::Degraded)) | (ProbeStatus::Degraded, _) => ProbeStatus::Degraded,
            _ => ProbeStatus::Up,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses((status = 200, description = "pong", body = String)),
)]
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = LivenessReport)),
)]
pub async fn liveness() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: ProbeStatus::Up,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/ready
///
/// 503 only when storage is unreachable; an empty pool reports `degraded`.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready, possibly degraded", body = ReadinessReport),
        (status = 503, description = "Storage unreachable", body = ReadinessReport),
    ),
)]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match &state.db {
        Some(db) => probe_database(db).await,
        None => StorageProbe {
            status: ProbeStatus::Up,
            backend: "memory".to_string(),
            round_trip_ms: None,
            error: None,
        },
    };
    let pool = match storage.status {
        ProbeStatus::Down => None,
        _ => Some(probe_pool(&state).await),
    };

    let status = ReadinessReport::overall(&storage, pool.as_ref());
    let code = match status {
        ProbeStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    let report = ReadinessReport {
        status,
        storage,
        pool,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    (code, Json(report))
}

async fn probe_database(db: &DbClient) -> StorageProbe {
    let started = std::time::Instant::now();
    let result = db.health_check().await;
    StorageProbe {
        status: if result.is_ok() { ProbeStatus::Up } else { ProbeStatus::Down },
        backend: "postgres".to_string(),
        round_trip_ms: result
            .as_ref()
            .ok()
            .map(|_| started.elapsed().as_millis() as u64),
        error: result.err().map(|e| e.message),
    }
}

async fn probe_pool(state: &AppState) -> PoolProbe {
    match state.engine.stats().await {
        Ok(stats) => PoolProbe {
            status: if stats.total_identifiers == 0 {
                ProbeStatus::Degraded
            } else {
                ProbeStatus::Up
            },
            identifiers: stats.total_identifiers,
            has_active: stats.active.is_some(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Pool probe failed");
            PoolProbe {
                status: ProbeStatus::Down,
                identifiers: 0,
                has_active: false,
            }
        }
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
