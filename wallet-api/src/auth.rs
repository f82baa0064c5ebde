//! Authentication
//!
//! Bearer tokens for wallet users and the admin console, salted password
//! hashes, and referral codes.
//!
//! A user token has `sub = <user id>`, the user's phone and the `user` role.
//! The admin token has `sub = <admin username>` and the `admin` role.

use crate::constants::{
    DEV_SIGNING_KEY, MIN_SIGNING_KEY_LENGTH, REFERRAL_CODE_LENGTH, ROLE_ADMIN, ROLE_USER,
    TOKEN_LEEWAY_SECS, TOKEN_TTL_SECS,
};
use crate::error::{ApiError, ApiResult};
use hmac::{Hmac, Mac};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;
use wallet_core::{ConfigError, UserId};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now" for token issue and expiry checks.
pub trait TokenClock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl TokenClock for WallClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FrozenClock(pub i64);

impl TokenClock for FrozenClock {
    fn now(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// SECRETS
// ============================================================================

/// HMAC key for signing tokens. Redacted in `Debug`.
#[derive(Clone)]
pub struct SigningKey(SecretString);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "WALLET_JWT_SECRET".to_string(),
            });
        }
        Ok(Self(SecretString::new(key.into())))
    }

    /// Built-in development key.
    pub fn development() -> Self {
        Self(SecretString::new(DEV_SIGNING_KEY.into()))
    }

    fn bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_development(&self) -> bool {
        self.0.expose_secret() == DEV_SIGNING_KEY
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<{} bytes>)", self.len())
    }
}

/// Username and password for the admin console.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    password: SecretString,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into()),
        }
    }

    /// Compares both fields in full, whichever one differs.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.expose_secret().as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminCredentials({}, <password>)", self.username)
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_key: SigningKey,
    /// Token lifetime, 30 days by default
    pub token_ttl_secs: i64,
    /// Accepted lateness when checking `exp`
    pub leeway_secs: i64,
    /// Admin login is disabled when unset.
    pub admin: Option<AdminCredentials>,
    pub clock: Arc<dyn TokenClock>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: SigningKey::development(),
            token_ttl_secs: TOKEN_TTL_SECS,
            leeway_secs: TOKEN_LEEWAY_SECS,
            admin: None,
            clock: Arc::new(WallClock),
        }
    }
}

fn env_i64(name: &str, fallback: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AuthConfig {
    /// Reads `WALLET_JWT_SECRET`, `WALLET_JWT_EXPIRATION_SECS`,
    /// `WALLET_JWT_CLOCK_SKEW_SECS` and `ADMIN_USERNAME`/`ADMIN_PASSWORD`.
    /// A missing secret falls back to the development key.
    pub fn from_env() -> Self {
        let signing_key = env_nonempty("WALLET_JWT_SECRET")
            .and_then(|key| SigningKey::new(key).ok())
            .unwrap_or_else(SigningKey::development);
        let admin = env_nonempty("ADMIN_USERNAME")
            .zip(env_nonempty("ADMIN_PASSWORD"))
            .map(|(user, pass)| AdminCredentials::new(user, pass));

        Self {
            signing_key,
            token_ttl_secs: env_i64("WALLET_JWT_EXPIRATION_SECS", TOKEN_TTL_SECS),
            leeway_secs: env_i64("WALLET_JWT_CLOCK_SKEW_SECS", TOKEN_LEEWAY_SECS),
            admin,
            clock: Arc::new(WallClock),
        }
    }

    /// Startup check: a weak signing key is fatal when
    /// `WALLET_ENVIRONMENT=production`, and only logged otherwise.
    pub fn check_deployment(&self) -> ApiResult<()> {
        let production = matches!(
            std::env::var("WALLET_ENVIRONMENT")
                .map(|v| v.to_ascii_lowercase())
                .as_deref(),
            Ok("production") | Ok("prod")
        );

        let weakness = if self.signing_key.is_development() {
            Some("WALLET_JWT_SECRET is not set".to_string())
        } else if self.signing_key.len() < MIN_SIGNING_KEY_LENGTH {
            Some(format!(
                "WALLET_JWT_SECRET has {} characters, at least {} are needed",
                self.signing_key.len(),
                MIN_SIGNING_KEY_LENGTH
            ))
        } else {
            None
        };

        match weakness {
            Some(reason) if production => {
                return Err(ApiError::invalid_input(format!(
                    "Refusing to start in production: {}",
                    reason
                )))
            }
            Some(reason) => tracing::warn!(%reason, "Weak token signing key"),
            None => {}
        }

        if self.admin.is_none() {
            tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, admin login is disabled");
        }
        Ok(())
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, or the admin username
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    fn issue(config: &AuthConfig, sub: String, phone: Option<String>, roles: Vec<String>) -> Self {
        let iat = config.clock.now();
        Self {
            sub,
            iat,
            exp: iat + config.token_ttl_secs,
            phone,
            roles,
        }
    }

    fn sign(&self, config: &AuthConfig) -> ApiResult<String> {
        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            self,
            &EncodingKey::from_secret(config.signing_key.bytes()),
        )
        .map_err(|e| ApiError::internal_error(format!("Failed to sign token: {}", e)))
    }
}

/// Caller identity, stored in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: String,
    /// `None` for the admin token
    pub user_id: Option<UserId>,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: Uuid::parse_str(&claims.sub).ok(),
            subject: claims.sub,
            roles: claims.roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// 401 unless this is a user token.
    pub fn require_user(&self) -> ApiResult<UserId> {
        match self.user_id {
            Some(id) if self.has_role(ROLE_USER) => Ok(id),
            _ => Err(ApiError::unauthorized("A user token is required")),
        }
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// Check the signature, then `exp` against the configured clock and leeway.
pub fn verify_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp"]);

    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.signing_key.bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => ApiError::invalid_token("Token signature is invalid"),
        ErrorKind::InvalidToken => ApiError::invalid_token("Token is malformed"),
        _ => ApiError::invalid_token(format!("Token rejected: {}", e)),
    })?
    .claims;

    if claims.exp + config.leeway_secs < config.clock.now() {
        return Err(ApiError::token_expired());
    }
    Ok(claims)
}

/// Token for an arbitrary subject.
pub fn issue_token(config: &AuthConfig, subject: String, roles: Vec<String>) -> ApiResult<String> {
    Claims::issue(config, subject, None, roles).sign(config)
}

pub fn issue_user_token(config: &AuthConfig, user_id: UserId, phone: &str) -> ApiResult<String> {
    Claims::issue(
        config,
        user_id.to_string(),
        Some(phone.to_string()),
        vec![ROLE_USER.to_string()],
    )
    .sign(config)
}

/// Resolve an `Authorization` header value to a caller.
pub fn authenticate(config: &AuthConfig, header: Option<&str>) -> ApiResult<AuthContext> {
    let header = header
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::invalid_token("Expected a Bearer token"))?;
    verify_token(config, token.trim()).map(AuthContext::from_claims)
}

/// Check admin console credentials and issue an admin token.
pub fn admin_login(config: &AuthConfig, username: &str, password: &str) -> ApiResult<String> {
    let admin = config
        .admin
        .as_ref()
        .ok_or_else(|| ApiError::internal_error("Admin login is not configured"))?;
    if !admin.matches(username, password) {
        return Err(ApiError::unauthorized("Invalid admin credentials"));
    }
    issue_token(config, admin.username.clone(), vec![ROLE_ADMIN.to_string()])
}

// ============================================================================
// PASSWORDS AND CODES
// ============================================================================

/// `salt$hex(hmac_sha256(salt, password))` with a fresh 16-byte salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    let salt = hex::encode(salt);
    let mac = keyed_mac(&salt, password)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;
    Ok(format!("{}${}", salt, hex::encode(mac.finalize().into_bytes())))
}

/// False for a wrong password and for anything that is not a `salt$digest`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    match (hex::decode(digest), keyed_mac(salt, password)) {
        (Ok(expected), Ok(mac)) => mac.verify_slice(&expected).is_ok(),
        _ => false,
    }
}

fn keyed_mac(salt: &str, password: &str) -> Result<HmacSha256, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())?;
    mac.update(password.as_bytes());
    Ok(mac)
}

/// Random uppercase alphanumeric referral code.
pub fn generate_referral_code() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
