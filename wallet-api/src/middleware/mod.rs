//! Middleware modules for the wallet API
//!
//! - `auth`: bearer-token authentication and the admin role guard
//!
//! # Middleware Order
//!
//! ```ignore
//! Router::new()
//!     .route("/api/admin/stats", get(handler))
//!     // Runs after auth: needs the AuthContext it injects
//!     .layer(middleware::from_fn(admin_guard_middleware))
//!     .layer(middleware::from_fn_with_state(auth_config, auth_middleware))
//! ```

mod auth;

pub use auth::{admin_guard_middleware, auth_middleware, AuthExtractor};
