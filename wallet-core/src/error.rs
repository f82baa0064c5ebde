//! Error types for wallet operations

use crate::{Amount, EntityType, TransactionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Payment identifier pool errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// No identifiers exist, so no recharge can be routed.
    #[error("Payment identifier pool is empty")]
    PoolEmpty,

    #[error("Payment identifier with handle '{handle}' already exists")]
    DuplicateHandle { handle: String },

    #[error("Payment identifier not found: {id}")]
    NotFound { id: Uuid },

    /// A rotation expected `expected` to be active but the pool moved on.
    #[error("Rotation conflict: identifier {expected} is no longer active")]
    RotationConflict { expected: Uuid },
}

/// Ledger (users, transactions, check-ins, investments) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: Uuid },

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    #[error("Invalid transition for transaction {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Phone number already registered")]
    DuplicatePhone,

    #[error("Investment plan not found: {name}")]
    PlanNotFound { name: String },

    /// A credit or debit would take a user total outside the paise range.
    #[error("Balance overflow for user {id}")]
    BalanceOverflow { id: Uuid },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all wallet errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_empty_display() {
        let msg = format!("{}", PoolError::PoolEmpty);
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_duplicate_handle_display_names_handle() {
        let err = PoolError::DuplicateHandle {
            handle: "shop@upi".to_string(),
        };
        assert!(format!("{}", err).contains("shop@upi"));
    }

    #[test]
    fn test_insufficient_balance_display() {
        let err = LedgerError::InsufficientBalance {
            available: 500,
            requested: 1_000,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("500"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn test_invalid_transition_display_uses_wire_names() {
        let err = LedgerError::InvalidTransition {
            id: Uuid::nil(),
            from: TransactionStatus::Completed,
            to: TransactionStatus::Rejected,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("completed -> rejected"));
    }

    #[test]
    fn test_wallet_error_from_pool_error() {
        let err: WalletError = PoolError::PoolEmpty.into();
        assert!(matches!(err, WalletError::Pool(PoolError::PoolEmpty)));
        assert!(format!("{}", err).starts_with("Pool error"));
    }

    #[test]
    fn test_wallet_error_from_storage_error() {
        let err: WalletError = StorageError::LockPoisoned.into();
        assert!(matches!(err, WalletError::Storage(StorageError::LockPoisoned)));
    }
}
