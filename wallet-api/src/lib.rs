//! Wallet API - REST Layer
//!
//! Axum server for the UPI wallet: accounts, recharges routed through the
//! rotating payment identifier pool, withdrawals, admin approval, daily
//! check-in and investments. Runs against PostgreSQL or in-memory stores.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod jobs;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{
    admin_login, authenticate, issue_token, issue_user_token, verify_token, AuthConfig,
    AuthContext, Claims,
};
pub use config::{wallet_config_from_env, ApiConfig, PoolSeedConfig};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{admin_guard_middleware, auth_middleware, AuthExtractor};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
