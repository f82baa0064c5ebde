//! Payment Identifier Administration Routes
//!
//! Pool management for operators. Mounted under /api/admin behind the admin
//! role guard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use wallet_core::{IdentifierId, PaymentIdentifier, PoolStats};
use wallet_rotation::RotationEngine;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::telemetry::metrics::{with_metrics, RotationTrigger};
use crate::types::{
    AddIdentifierRequest, RemoveIdentifierResponse, RotateResponse, UpdateIdentifierRequest,
};

/// GET /api/admin/identifiers
#[utoipa::path(
    get,
    path = "/api/admin/identifiers",
    tag = "Identifiers",
    responses(
        (status = 200, description = "Pool ordered by position", body = [PaymentIdentifier]),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_identifiers(
    State(engine): State<RotationEngine>,
) -> ApiResult<Json<Vec<PaymentIdentifier>>> {
    Ok(Json(engine.list_identifiers().await?))
}

/// POST /api/admin/identifiers
#[utoipa::path(
    post,
    path = "/api/admin/identifiers",
    tag = "Identifiers",
    request_body = AddIdentifierRequest,
    responses(
        (status = 201, description = "Identifier added at the end of the rotation", body = PaymentIdentifier),
        (status = 400, description = "Malformed handle or cap", body = ApiError),
        (status = 409, description = "Handle already in the pool", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_identifier(
    State(engine): State<RotationEngine>,
    Json(req): Json<AddIdentifierRequest>,
) -> ApiResult<(StatusCode, Json<PaymentIdentifier>)> {
    let identifier = engine
        .add_identifier(&req.handle, req.max_payments_per_cycle)
        .await?;
    Ok((StatusCode::CREATED, Json(identifier)))
}

/// PATCH /api/admin/identifiers/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/identifiers/{id}",
    tag = "Identifiers",
    params(("id" = String, Path, description = "Identifier ID")),
    request_body = UpdateIdentifierRequest,
    responses(
        (status = 200, description = "Handle updated", body = PaymentIdentifier),
        (status = 404, description = "Identifier not found", body = ApiError),
        (status = 409, description = "Handle already in the pool", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_identifier(
    State(engine): State<RotationEngine>,
    Path(id): Path<IdentifierId>,
    Json(req): Json<UpdateIdentifierRequest>,
) -> ApiResult<Json<PaymentIdentifier>> {
    Ok(Json(engine.update_identifier(id, &req.handle).await?))
}

/// DELETE /api/admin/identifiers/{id}
///
/// Removing the active identifier hands the pool to its successor first.
#[utoipa::path(
    delete,
    path = "/api/admin/identifiers/{id}",
    tag = "Identifiers",
    params(("id" = String, Path, description = "Identifier ID")),
    responses(
        (status = 200, description = "Identifier removed", body = RemoveIdentifierResponse),
        (status = 404, description = "Identifier not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_identifier(
    State(state): State<AppState>,
    Path(id): Path<IdentifierId>,
) -> ApiResult<Json<RemoveIdentifierResponse>> {
    let was_active = state
        .identifiers
        .identifier_get(id)
        .await?
        .is_some_and(|identifier| identifier.active);

    let removed = state.engine.retire_identifier(id).await?;
    let active = state.identifiers.identifier_get_active().await?;
    if was_active && active.is_some() {
        with_metrics(|m| m.record_rotation(RotationTrigger::Retire));
    }

    Ok(Json(RemoveIdentifierResponse {
        removed: removed.id,
        active,
    }))
}

/// POST /api/admin/identifiers/rotate
#[utoipa::path(
    post,
    path = "/api/admin/identifiers/rotate",
    tag = "Identifiers",
    responses(
        (status = 200, description = "Active identifier after rotation", body = RotateResponse),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn rotate(State(engine): State<RotationEngine>) -> ApiResult<Json<RotateResponse>> {
    let Some(current) = engine.store().identifier_get_active().await? else {
        return Ok(Json(RotateResponse {
            active: None,
            rotated: false,
        }));
    };

    let outcome = engine.rotate_from(current.id).await?;
    let rotated = outcome.rotated();
    if rotated {
        with_metrics(|m| m.record_rotation(RotationTrigger::Manual));
    }
    Ok(Json(RotateResponse {
        active: outcome.active().cloned(),
        rotated,
    }))
}

/// GET /api/admin/identifiers/stats
#[utoipa::path(
    get,
    path = "/api/admin/identifiers/stats",
    tag = "Identifiers",
    responses(
        (status = 200, description = "Pool statistics", body = PoolStats),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn stats(State(engine): State<RotationEngine>) -> ApiResult<Json<PoolStats>> {
    Ok(Json(engine.stats().await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_identifiers).post(add_identifier))
        .route("/rotate", post(rotate))
        .route("/stats", get(stats))
        .route("/:id", patch(update_identifier).delete(remove_identifier))
}
