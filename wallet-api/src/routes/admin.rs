//! Admin Routes
//!
//! Transaction decisions, ledger overviews and the daily growth trigger.
//! Mounted behind the admin role guard.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use wallet_core::{today_utc, GrowthReport, InvestmentStats, LedgerStats, User, WalletTransaction};

use crate::error::{ApiError, ApiResult};
use crate::services;
use crate::state::AppState;
use crate::types::{ApprovalResponse, TransactionDecisionRequest};

/// GET /api/admin/stats
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Ledger totals", body = LedgerStats),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<LedgerStats>> {
    Ok(Json(services::ledger_stats(&state).await?))
}

/// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users, newest first", body = [User]),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(services::all_users(&state).await?))
}

/// GET /api/admin/transactions
#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    tag = "Admin",
    responses(
        (status = 200, description = "Latest transactions, newest first", body = [WalletTransaction]),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn transactions(State(state): State<AppState>) -> ApiResult<Json<Vec<WalletTransaction>>> {
    Ok(Json(services::all_transactions(&state).await?))
}

/// GET /api/admin/pending
#[utoipa::path(
    get,
    path = "/api/admin/pending",
    tag = "Admin",
    responses(
        (status = 200, description = "Transactions awaiting a decision", body = [WalletTransaction]),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn pending(State(state): State<AppState>) -> ApiResult<Json<Vec<WalletTransaction>>> {
    Ok(Json(services::pending_transactions(&state).await?))
}

/// GET /api/admin/pending-withdrawals
#[utoipa::path(
    get,
    path = "/api/admin/pending-withdrawals",
    tag = "Admin",
    responses(
        (status = 200, description = "Withdrawals awaiting payout", body = [WalletTransaction]),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn pending_withdrawals(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WalletTransaction>>> {
    Ok(Json(services::pending_withdrawals(&state).await?))
}

/// GET /api/admin/investment-stats
#[utoipa::path(
    get,
    path = "/api/admin/investment-stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Investment totals", body = InvestmentStats),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn investment_stats(State(state): State<AppState>) -> ApiResult<Json<InvestmentStats>> {
    Ok(Json(services::investment_stats(&state).await?))
}

/// POST /api/admin/approve
#[utoipa::path(
    post,
    path = "/api/admin/approve",
    tag = "Admin",
    request_body = TransactionDecisionRequest,
    responses(
        (status = 200, description = "Transaction completed", body = ApprovalResponse),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 409, description = "Transaction already decided", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<TransactionDecisionRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    Ok(Json(services::approve(&state, req.transaction_id).await?))
}

/// POST /api/admin/reject
#[utoipa::path(
    post,
    path = "/api/admin/reject",
    tag = "Admin",
    request_body = TransactionDecisionRequest,
    responses(
        (status = 200, description = "Transaction rejected", body = WalletTransaction),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 409, description = "Transaction already decided", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject(
    State(state): State<AppState>,
    Json(req): Json<TransactionDecisionRequest>,
) -> ApiResult<Json<WalletTransaction>> {
    Ok(Json(services::reject(&state, req.transaction_id).await?))
}

/// POST /api/admin/daily-growth
#[utoipa::path(
    post,
    path = "/api/admin/daily-growth",
    tag = "Admin",
    responses(
        (status = 200, description = "Payouts made for today", body = GrowthReport),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn daily_growth(State(state): State<AppState>) -> ApiResult<Json<GrowthReport>> {
    Ok(Json(services::process_daily_growth(&state, today_utc()).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(users))
        .route("/transactions", get(transactions))
        .route("/pending", get(pending))
        .route("/pending-withdrawals", get(pending_withdrawals))
        .route("/investment-stats", get(investment_stats))
        .route("/approve", post(approve))
        .route("/reject", post(reject))
        .route("/daily-growth", post(daily_growth))
}
