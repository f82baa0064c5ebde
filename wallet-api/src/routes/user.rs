//! User Routes
//!
//! Profile and daily check-in for the authenticated user.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use wallet_core::User;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::services;
use crate::state::AppState;
use crate::types::CheckinResponse;

/// GET /api/user/profile
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "User",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "User no longer exists", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<User>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::profile(&state, user_id).await?))
}

/// POST /api/user/checkin
#[utoipa::path(
    post,
    path = "/api/user/checkin",
    tag = "User",
    responses(
        (status = 200, description = "Bonus credited", body = CheckinResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Already checked in today", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn checkin(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<CheckinResponse>> {
    let user_id = auth.require_user()?;
    Ok(Json(services::checkin(&state, user_id).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/checkin", post(checkin))
}
