//! Constants for the wallet API
//!
//! Centralized constant values used throughout the API.

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Token lifetime (30 days)
pub const TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

pub const TOKEN_LEEWAY_SECS: i64 = 60;

pub const MIN_SIGNING_KEY_LENGTH: usize = 32;

/// Used when `WALLET_JWT_SECRET` is unset; refused in production.
pub const DEV_SIGNING_KEY: &str = "wallet-dev-signing-key-not-for-production";

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Minimum password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum phone number length at registration
pub const MIN_PHONE_LENGTH: usize = 10;

pub const REFERRAL_CODE_LENGTH: usize = 6;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// PAGINATION
// ============================================================================

/// Transactions returned to a user
pub const USER_TRANSACTION_LIMIT: i64 = 50;

/// Transactions returned on the admin console
pub const ADMIN_TRANSACTION_LIMIT: i64 = 200;

// ============================================================================
// BACKGROUND JOBS
// ============================================================================

/// Default interval between daily growth runs (1 hour). Runs are idempotent
/// per calendar day, so the job can tick more often than daily.
pub const DEFAULT_GROWTH_CHECK_INTERVAL_SECS: u64 = 3600;

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
