//! Authentication Routes
//!
//! Public endpoints that issue bearer tokens.

use axum::{extract::State, routing::post, Json, Router};

use std::sync::Arc;

use crate::auth::{admin_login, AuthConfig};
use crate::error::{ApiError, ApiResult};
use crate::services;
use crate::state::AppState;
use crate::types::{AdminAuthResponse, AdminLoginRequest, AuthResponse, LoginRequest, RegisterRequest};

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid phone or password", body = ApiError),
        (status = 409, description = "Phone already registered", body = ApiError),
    ),
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(services::register(&state, req).await?))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid phone or password", body = ApiError),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(services::login(&state, req).await?))
}

/// POST /api/auth/admin-login
#[utoipa::path(
    post,
    path = "/api/auth/admin-login",
    tag = "Auth",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin token", body = AdminAuthResponse),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 500, description = "Admin login not configured", body = ApiError),
    ),
)]
pub async fn admin_login_handler(
    State(auth_config): State<Arc<AuthConfig>>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<Json<AdminAuthResponse>> {
    let token = admin_login(&auth_config, &req.username, &req.password)?;
    tracing::info!(username = %req.username, "Admin signed in");
    Ok(Json(AdminAuthResponse { token }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin-login", post(admin_login_handler))
}
