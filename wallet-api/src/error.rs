//! API Errors
//!
//! Every failure leaves the server as `{ code, message, details? }` JSON with
//! the HTTP status implied by `code`. Domain errors from the stores and the
//! rotation engine are mapped here, so handlers just use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use wallet_core::{
    format_rupees, ConfigError, LedgerError, PoolError, StorageError, ValidationError,
    WalletError,
};

// ============================================================================
// ERROR CODES
// ============================================================================

/// Machine-readable error category, serialized as `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 401 / 403
    Unauthorized,
    Forbidden,
    InvalidToken,
    TokenExpired,

    // 400
    ValidationFailed,
    InvalidInput,
    MissingField,
    /// Balance does not cover the requested debit
    InsufficientBalance,

    // 404
    EntityNotFound,
    UserNotFound,
    TransactionNotFound,
    IdentifierNotFound,
    PlanNotFound,

    // 409
    EntityAlreadyExists,
    /// Transaction already decided, or a rotation lost a race
    StateConflict,
    AlreadyCheckedIn,

    // 5xx
    InternalError,
    DatabaseError,
    /// Retryable; an empty identifier pool lands here
    ServiceUnavailable,
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// HTTP status and fallback message.
    fn describe(self) -> (StatusCode, &'static str) {
        use ErrorCode::*;
        match self {
            Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
            TokenExpired => (StatusCode::UNAUTHORIZED, "Authentication token has expired"),
            Forbidden => (StatusCode::FORBIDDEN, "Access forbidden"),

            ValidationFailed => (StatusCode::BAD_REQUEST, "Request validation failed"),
            InvalidInput => (StatusCode::BAD_REQUEST, "Invalid input"),
            MissingField => (StatusCode::BAD_REQUEST, "Required field is missing"),
            InsufficientBalance => (StatusCode::BAD_REQUEST, "Insufficient balance"),

            EntityNotFound => (StatusCode::NOT_FOUND, "Not found"),
            UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            TransactionNotFound => (StatusCode::NOT_FOUND, "Transaction not found"),
            IdentifierNotFound => (StatusCode::NOT_FOUND, "Payment identifier not found"),
            PlanNotFound => (StatusCode::NOT_FOUND, "Investment plan not found"),

            EntityAlreadyExists => (StatusCode::CONFLICT, "Already exists"),
            StateConflict => (StatusCode::CONFLICT, "Conflicts with the current state"),
            AlreadyCheckedIn => (StatusCode::CONFLICT, "Already checked in today"),

            InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            DatabaseError => (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed"),
            ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable"),
            ConnectionPoolExhausted => (StatusCode::SERVICE_UNAVAILABLE, "Connection pool exhausted"),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.describe().0
    }

    pub fn default_message(&self) -> &'static str {
        self.describe().1
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Structured context, e.g. the available balance on a failed debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

/// `pub fn name(message) -> ApiError` for codes that take a free-form message.
macro_rules! message_constructors {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )*
    };
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Error carrying the code's fallback message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    message_constructors! {
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        invalid_token => InvalidToken,
        validation_failed => ValidationFailed,
        invalid_input => InvalidInput,
        not_found => EntityNotFound,
        entity_already_exists => EntityAlreadyExists,
        state_conflict => StateConflict,
        internal_error => InternalError,
        database_error => DatabaseError,
        service_unavailable => ServiceUnavailable,
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("'{}' is required", field))
    }

    pub fn user_not_found(user_id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User {} not found", user_id))
    }

    pub fn transaction_not_found(transaction_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TransactionNotFound,
            format!("Transaction {} not found", transaction_id),
        )
    }

    pub fn identifier_not_found(identifier_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::IdentifierNotFound,
            format!("Payment identifier {} not found", identifier_id),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// DOMAIN ERROR MAPPING
// ============================================================================

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Pool(e) => e.into(),
            WalletError::Ledger(e) => e.into(),
            WalletError::Storage(e) => e.into(),
            WalletError::Validation(e) => e.into(),
            WalletError::Config(e) => e.into(),
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::PoolEmpty => ApiError::service_unavailable(
                "No payment identifier is available right now, please try again later",
            ),
            PoolError::DuplicateHandle { handle } => {
                ApiError::entity_already_exists(format!("'{}' is already in the pool", handle))
            }
            PoolError::NotFound { id } => ApiError::identifier_not_found(id),
            PoolError::RotationConflict { .. } => ApiError::state_conflict(err.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UserNotFound { id } => ApiError::user_not_found(id),
            LedgerError::TransactionNotFound { id } => ApiError::transaction_not_found(id),
            LedgerError::InsufficientBalance {
                available,
                requested,
            } => ApiError::from_code(ErrorCode::InsufficientBalance).with_details(
                serde_json::json!({
                    "available": available,
                    "requested": requested,
                    "availableRupees": format_rupees(available),
                }),
            ),
            LedgerError::InvalidTransition { .. } => ApiError::state_conflict(err.to_string()),
            LedgerError::AlreadyCheckedIn => ApiError::from_code(ErrorCode::AlreadyCheckedIn),
            LedgerError::DuplicatePhone => {
                ApiError::entity_already_exists("Phone number already registered")
            }
            LedgerError::PlanNotFound { name } => ApiError::new(
                ErrorCode::PlanNotFound,
                format!("Investment plan '{}' not found", name),
            ),
            LedgerError::BalanceOverflow { .. } => {
                ApiError::validation_failed("Amount exceeds the wallet balance range")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, id } => {
                ApiError::not_found(format!("{:?} {} not found", entity_type, id))
            }
            other => {
                tracing::error!(error = %other, "Storage error");
                ApiError::database_error(ErrorCode::DatabaseError.default_message())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            other => ApiError::validation_failed(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::internal_error(err.to_string())
    }
}

// ============================================================================
// INFRASTRUCTURE ERROR MAPPING
// ============================================================================

/// Details are logged, never returned.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = ?err, "PostgreSQL error");
        ApiError::database_error(ErrorCode::DatabaseError.default_message())
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "Could not check out a database connection");
        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database pool is closed")
            }
            _ => ApiError::database_error("Could not check out a database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}
