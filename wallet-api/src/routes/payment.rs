//! Payment Routes
//!
//! Recharge and withdrawal requests plus the caller's transaction and
//! withdrawal history.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use wallet_core::WalletTransaction;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::services;
use crate::state::AppState;
use crate::types::{ConfirmRechargeRequest, RechargeRequest, RechargeResponse, WithdrawRequest};

/// POST /api/payment/recharge
#[utoipa::path(
    post,
    path = "/api/payment/recharge",
    tag = "Payments",
    request_body = RechargeRequest,
    responses(
        (status = 200, description = "UPI handle to pay", body = RechargeResponse),
        (status = 400, description = "Invalid amount", body = ApiError),
        (status = 503, description = "No payment identifier available, retry later", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn recharge(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<RechargeRequest>,
) -> ApiResult<Json<RechargeResponse>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::initiate_recharge(&state, user_id, req).await?))
}

/// POST /api/payment/recharge/confirm
#[utoipa::path(
    post,
    path = "/api/payment/recharge/confirm",
    tag = "Payments",
    request_body = ConfirmRechargeRequest,
    responses(
        (status = 200, description = "Recharge awaiting verification", body = WalletTransaction),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 409, description = "Recharge is no longer pending", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm_recharge(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<ConfirmRechargeRequest>,
) -> ApiResult<Json<WalletTransaction>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::confirm_recharge(&state, user_id, req).await?))
}

/// POST /api/payment/withdraw
#[utoipa::path(
    post,
    path = "/api/payment/withdraw",
    tag = "Payments",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal requested", body = WalletTransaction),
        (status = 400, description = "Invalid amount or insufficient balance", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<Json<WalletTransaction>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::initiate_withdraw(&state, user_id, req).await?))
}

/// GET /api/transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Payments",
    responses(
        (status = 200, description = "Latest transactions, newest first", body = [WalletTransaction]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn transactions(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<WalletTransaction>>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::user_transactions(&state, user_id).await?))
}

/// GET /api/withdrawals
#[utoipa::path(
    get,
    path = "/api/withdrawals",
    tag = "Payments",
    responses(
        (status = 200, description = "Latest withdrawals, newest first", body = [WalletTransaction]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdrawals(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<Vec<WalletTransaction>>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::user_withdrawals(&state, user_id).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/payment/recharge", post(recharge))
        .route("/payment/recharge/confirm", post(confirm_recharge))
        .route("/payment/withdraw", post(withdraw))
        .route("/transactions", get(transactions))
        .route("/withdrawals", get(withdrawals))
}
