//! API Configuration
//!
//! CORS settings, identifier pool seeding and the domain configuration,
//! loaded from environment variables with development defaults.

use crate::constants::DEFAULT_CORS_MAX_AGE_SECS;
use wallet_core::{normalize_handle, WalletConfig};

// ============================================================================
// HTTP
// ============================================================================

/// CORS settings for the browser clients.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Exact origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// `WALLET_CORS_ORIGINS` (comma-separated), `WALLET_CORS_ALLOW_CREDENTIALS`
    /// and `WALLET_CORS_MAX_AGE_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cors_origins: std::env::var("WALLET_CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.cors_origins),
            cors_allow_credentials: env_parse("WALLET_CORS_ALLOW_CREDENTIALS")
                .unwrap_or(defaults.cors_allow_credentials),
            cors_max_age_secs: env_parse("WALLET_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
        }
    }
}

// ============================================================================
// POOL SEEDING
// ============================================================================

/// Handles added to an empty identifier pool at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSeedConfig {
    pub handles: Vec<String>,
}

impl PoolSeedConfig {
    /// Read `WALLET_SEED_HANDLES` (comma-separated). Malformed handles are
    /// skipped with a warning.
    pub fn from_env() -> Self {
        std::env::var("WALLET_SEED_HANDLES")
            .map(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Self {
        let mut handles: Vec<String> = Vec::new();
        for candidate in split_list(raw) {
            match normalize_handle(&candidate) {
                Ok(handle) if !handles.contains(&handle) => handles.push(handle),
                Ok(_) => {}
                Err(e) => tracing::warn!(handle = %candidate, error = %e, "Skipping seed handle"),
            }
        }
        Self { handles }
    }
}

// ============================================================================
// DOMAIN CONFIGURATION
// ============================================================================

/// Build the domain configuration from the environment.
///
/// - `WALLET_MAX_PAYMENTS_PER_CYCLE`: default cap for new identifiers (default: 10)
/// - `WALLET_CHECKIN_MIN_BONUS` / `WALLET_CHECKIN_MAX_BONUS`: bonus range in paise
/// - `WALLET_MIN_WITHDRAWAL` / `WALLET_MAX_RECHARGE`: request bounds in paise
pub fn wallet_config_from_env() -> WalletConfig {
    let mut config = WalletConfig::default();

    if let Some(cap) = env_parse("WALLET_MAX_PAYMENTS_PER_CYCLE") {
        config.rotation.default_max_payments_per_cycle = cap;
    }
    if let Some(min) = env_parse("WALLET_CHECKIN_MIN_BONUS") {
        config.checkin.min_bonus = min;
    }
    if let Some(max) = env_parse("WALLET_CHECKIN_MAX_BONUS") {
        config.checkin.max_bonus = max;
    }
    if let Some(min) = env_parse("WALLET_MIN_WITHDRAWAL") {
        config.limits.min_withdrawal = min;
    }
    if let Some(max) = env_parse("WALLET_MAX_RECHARGE") {
        config.limits.max_recharge = max;
    }

    config
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
