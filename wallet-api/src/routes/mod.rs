//! REST API Routes Module
//!
//! Route handlers grouped by area:
//! - Auth (public): register, login, admin login
//! - User, payments and investments (bearer token)
//! - Admin and payment identifier pool (bearer token with the admin role)
//! - Health checks, metrics and the OpenAPI document (public)

pub mod admin;
pub mod auth;
pub mod health;
pub mod identifiers;
pub mod investment;
pub mod payment;
pub mod user;

use std::time::Duration;

use axum::{
    extract::OriginalUri,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::middleware::{admin_guard_middleware, auth_middleware};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// JSON 404 for unknown /api paths.
async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes for signed-in users.
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/user", user::create_router())
        .merge(payment::create_router())
        .merge(investment::create_router())
        .route_layer(from_fn_with_state(state.auth.clone(), auth_middleware))
}

/// Routes that need the admin role.
///
/// Layers run bottom-up: authentication first, then the role guard.
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(admin::create_router())
        .nest("/identifiers", identifiers::create_router())
        .route_layer(from_fn(admin_guard_middleware))
        .route_layer(from_fn_with_state(state.auth.clone(), auth_middleware))
}

/// Create the complete API router.
///
/// - /api/auth/* (public)
/// - /api/user/*, /api/payment/*, /api/transactions, /api/invest* (user)
/// - /api/admin/* (admin)
/// - /health/*, /metrics, /openapi.json (public)
/// - /swagger-ui (when the swagger-ui feature is enabled)
///
/// # Middleware Order (outer to inner)
/// 1. TraceLayer
/// 2. CORS - handles preflight requests
/// 3. Observability - tracing span and metrics
/// 4. Auth and admin guard (route layers on protected groups)
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let api = Router::new()
        .nest("/auth", auth::create_router())
        .merge(user_routes(&state))
        .nest("/admin", admin_routes(&state))
        .fallback(api_not_found);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api", api)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(api_config))
            .layer(from_fn(observability_middleware)),
    )
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
