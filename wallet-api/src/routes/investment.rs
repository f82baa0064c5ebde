//! Investment Routes

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use wallet_core::{Investment, InvestmentPlan, WalletConfig};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::services;
use crate::state::AppState;
use crate::types::InvestRequest;

/// GET /api/investment-plans
#[utoipa::path(
    get,
    path = "/api/investment-plans",
    tag = "Investments",
    responses(
        (status = 200, description = "Plan catalogue", body = [InvestmentPlan]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_plans(State(wallet): State<Arc<WalletConfig>>) -> Json<Vec<InvestmentPlan>> {
    Json(wallet.plans.clone())
}

/// POST /api/invest
#[utoipa::path(
    post,
    path = "/api/invest",
    tag = "Investments",
    request_body = InvestRequest,
    responses(
        (status = 200, description = "Investment opened", body = Investment),
        (status = 400, description = "Insufficient balance", body = ApiError),
        (status = 404, description = "Unknown plan", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn invest(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<InvestRequest>,
) -> ApiResult<Json<Investment>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::invest(&state, user_id, req).await?))
}

/// GET /api/investments
#[utoipa::path(
    get,
    path = "/api/investments",
    tag = "Investments",
    responses(
        (status = 200, description = "Caller's investments", body = [Investment]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_investments(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<Investment>>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::user_investments(&state, user_id).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/investment-plans", get(list_plans))
        .route("/invest", post(invest))
        .route("/investments", get(list_investments))
}
