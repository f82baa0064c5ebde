//! Bearer-token authentication and the admin role guard
//!
//! `auth_middleware` turns the `Authorization` header into an [`AuthContext`]
//! request extension or answers 401. `admin_guard_middleware` sits inside it
//! on `/api/admin` and answers 403 for anything but the admin token.

use crate::auth::{authenticate, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub async fn auth_middleware(
    State(config): State<Arc<AuthConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let caller = authenticate(&config, header)?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

pub async fn admin_guard_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let caller = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    if let Err(e) = caller.require_admin() {
        tracing::warn!(subject = %caller.subject, path = %request.uri().path(), "Admin route refused");
        return Err(e);
    }
    Ok(next.run(request).await)
}

/// The caller, as stored by [`auth_middleware`].
///
/// Rejects with 500 on a route the middleware does not cover.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(caller) => Ok(AuthExtractor(caller.clone())),
            None => Err(ApiError::internal_error(
                "Route is missing the authentication layer",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{clocks, issue_token};
    use crate::constants::{ROLE_ADMIN, ROLE_USER};
    use crate::error::{ApiResult, ErrorCode};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            clock: Arc::new(clocks::ISSUED),
            ..AuthConfig::default()
        })
    }

    fn app(config: Arc<AuthConfig>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "admin" }))
            .layer(middleware::from_fn(admin_guard_middleware))
            .route("/me", get(|AuthExtractor(auth): AuthExtractor| async move { auth.subject }))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    fn request(path: &str, token: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(config()).oneshot(request("/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_token_passes_auth_but_not_admin_guard() -> ApiResult<()> {
        let config = config();
        let token = issue_token(&config, "alice".to_string(), vec![ROLE_USER.to_string()])?;

        let me = app(config.clone()).oneshot(request("/me", Some(&token))).await.unwrap();
        assert_eq!(me.status(), StatusCode::OK);

        let admin = app(config).oneshot(request("/admin", Some(&token))).await.unwrap();
        assert_eq!(admin.status(), StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_token_passes_guard() -> ApiResult<()> {
        let config = config();
        let token = issue_token(&config, "root".to_string(), vec![ROLE_ADMIN.to_string()])?;
        let response = app(config).oneshot(request("/admin", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_extractor_without_layer_is_internal_error() {
        let bare = Router::new().route(
            "/me",
            get(|AuthExtractor(auth): AuthExtractor| async move { auth.subject }),
        );
        let response = bare.oneshot(request("/me", None)).await.unwrap();
        assert_eq!(response.status(), ErrorCode::InternalError.status_code());
    }
}
