//! Property-Based Tests for Authentication Enforcement
//!
//! Requests without a valid bearer token get 401 on every protected route;
//! valid user tokens get 403 on admin routes; admin tokens pass both layers.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use proptest::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;
use wallet_api::{
    admin_guard_middleware, auth_middleware,
    auth::{issue_token, issue_user_token, AuthConfig, SigningKey},
    constants::ROLE_ADMIN,
};

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

const TEST_KEY: &str = "property-test-signing-key-0123456789";

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        signing_key: SigningKey::new(TEST_KEY).unwrap(),
        ..AuthConfig::default()
    }
}

/// User route plus an admin route, layered like the real router.
fn test_app(config: &AuthConfig) -> Router {
    let config = Arc::new(config.clone());
    let user = Router::new()
        .route("/api/user/profile", get(|| async { "user" }))
        .route_layer(middleware::from_fn_with_state(config.clone(), auth_middleware));
    let admin = Router::new()
        .route("/api/admin/stats", get(|| async { "admin" }))
        .route_layer(middleware::from_fn(admin_guard_middleware))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware));
    user.merge(admin)
}

async fn status_for(app: Router, uri: &str, auth: Option<String>) -> StatusCode {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = auth {
        builder = builder.header("authorization", value);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

#[derive(Debug, Clone)]
enum BadAuth {
    /// Random bearer token that is not a JWT
    Garbage(String),
    /// Non-bearer scheme
    WrongScheme(String),
    /// No header at all
    Missing,
}

fn bad_auth_strategy() -> impl Strategy<Value = BadAuth> {
    prop_oneof![
        "[a-zA-Z0-9._-]{1,80}".prop_map(BadAuth::Garbage),
        "[a-zA-Z0-9]{1,40}".prop_map(BadAuth::WrongScheme),
        Just(BadAuth::Missing),
    ]
}

impl BadAuth {
    fn header(&self) -> Option<String> {
        match self {
            BadAuth::Garbage(token) => Some(format!("Bearer {}", token)),
            BadAuth::WrongScheme(value) => Some(format!("Basic {}", value)),
            BadAuth::Missing => None,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invalid credentials never reach a handler.
    #[test]
    fn prop_invalid_auth_is_rejected(auth in bad_auth_strategy(), admin_route in any::<bool>()) {
        let config = test_auth_config();
        let uri = if admin_route { "/api/admin/stats" } else { "/api/user/profile" };
        let status = runtime().block_on(status_for(test_app(&config), uri, auth.header()));
        prop_assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    /// A user token opens user routes but never admin routes.
    #[test]
    fn prop_user_token_is_not_admin(phone in "[6-9][0-9]{9}") {
        let config = test_auth_config();
        let token = issue_user_token(&config, uuid::Uuid::now_v7(), &phone).unwrap();
        let header = Some(format!("Bearer {}", token));

        let rt = runtime();
        let user = rt.block_on(status_for(test_app(&config), "/api/user/profile", header.clone()));
        let admin = rt.block_on(status_for(test_app(&config), "/api/admin/stats", header));
        prop_assert_eq!(user, StatusCode::OK);
        prop_assert_eq!(admin, StatusCode::FORBIDDEN);
    }

    /// Tokens signed with another secret are rejected.
    #[test]
    fn prop_foreign_secret_is_rejected(secret in "[a-zA-Z0-9]{32,64}") {
        let config = test_auth_config();
        let foreign = AuthConfig {
            signing_key: SigningKey::new(secret.clone()).unwrap(),
            ..AuthConfig::default()
        };
        prop_assume!(secret != TEST_KEY);

        let token = issue_token(&foreign, "ops".to_string(), vec![ROLE_ADMIN.to_string()]).unwrap();
        let status = runtime().block_on(status_for(
            test_app(&config),
            "/api/admin/stats",
            Some(format!("Bearer {}", token)),
        ));
        prop_assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_admin_token_passes_both_layers() {
    let config = test_auth_config();
    let token = issue_token(&config, "ops".to_string(), vec![ROLE_ADMIN.to_string()]).unwrap();
    let status = status_for(
        test_app(&config),
        "/api/admin/stats",
        Some(format!("Bearer {}", token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
