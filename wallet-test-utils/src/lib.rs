//! Wallet Test Utilities
//!
//! Shared test infrastructure for the wallet workspace:
//! - Proptest generators for pool and ledger types
//! - Fixtures for populated pools and funded users
//! - Assertions for wallet error variants

pub use wallet_storage::{InMemoryIdentifierStore, InMemoryLedger};

pub use wallet_core::{
    Amount, IdentifierId, LedgerError, NewRecharge, NewUser, PaymentIdentifier, PoolError,
    TransactionKind, TransactionStatus, User, WalletError, WalletResult,
};

use chrono::Utc;
use uuid::Uuid;
use wallet_storage::{IdentifierStore, LedgerStore};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for wallet types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a valid UPI handle.
    pub fn arb_handle() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9.]{0,11}", prop::sample::select(vec!["upi", "okaxis", "ybl", "paytm"]))
            .prop_map(|(name, provider)| format!("{}@{}", name, provider))
    }

    /// Generate an amount in paise between ₹1 and ₹1,00,000.
    pub fn arb_amount() -> impl Strategy<Value = Amount> {
        100i64..=10_000_000
    }

    pub fn arb_transaction_status() -> impl Strategy<Value = TransactionStatus> {
        prop_oneof![
            Just(TransactionStatus::Pending),
            Just(TransactionStatus::VerificationPending),
            Just(TransactionStatus::Completed),
            Just(TransactionStatus::Rejected),
        ]
    }

    /// Generate an identifier at an arbitrary position with a counter below
    /// its cap.
    pub fn arb_identifier() -> impl Strategy<Value = PaymentIdentifier> {
        (arb_handle(), 1i32..1_000, 1i32..50, any::<bool>()).prop_flat_map(
            |(handle, position, cap, active)| {
                (0..cap).prop_map(move |payments| {
                    let mut identifier = fixtures::identifier_at(position);
                    identifier.handle = handle.clone();
                    identifier.max_payments_per_cycle = cap;
                    identifier.successful_payments = payments;
                    identifier.active = active;
                    identifier
                })
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    /// An inactive identifier at `position` with the default cap.
    pub fn identifier_at(position: i32) -> PaymentIdentifier {
        let now = Utc::now();
        PaymentIdentifier {
            id: Uuid::now_v7(),
            handle: format!("merchant{}@upi", position),
            position,
            active: false,
            successful_payments: 0,
            max_payments_per_cycle: 10,
            created_at: now,
            updated_at: now,
        }
    }

    /// In-memory pool with `count` identifiers at positions 1..=count, none
    /// active.
    pub async fn populated_pool(count: usize) -> InMemoryIdentifierStore {
        populated_pool_with_cap(count, 10).await
    }

    pub async fn populated_pool_with_cap(count: usize, cap: i32) -> InMemoryIdentifierStore {
        let store = InMemoryIdentifierStore::new();
        for n in 1..=count {
            store
                .identifier_add(&format!("merchant{}@upi", n), cap)
                .await
                .unwrap_or_else(|e| panic!("fixture pool insert failed: {}", e));
        }
        store
    }

    /// Drive the identifier's counter up by `count` settlements.
    pub async fn settle_times(store: &InMemoryIdentifierStore, id: IdentifierId, count: usize) {
        for _ in 0..count {
            store
                .identifier_increment_payments(id)
                .await
                .unwrap_or_else(|e| panic!("fixture increment failed: {}", e));
        }
    }

    /// A fresh user registered under `phone`.
    pub async fn registered_user(ledger: &InMemoryLedger, phone: &str) -> User {
        ledger
            .user_create(NewUser {
                phone: phone.to_string(),
                password_hash: "fixture$hash".to_string(),
                referral_code: "FIXT00".to_string(),
                referred_by: None,
            })
            .await
            .unwrap_or_else(|e| panic!("fixture user insert failed: {}", e))
    }

    /// A user whose balance was topped up through a settled recharge.
    pub async fn funded_user(ledger: &InMemoryLedger, phone: &str, balance: Amount) -> User {
        let user = registered_user(ledger, phone).await;
        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: balance,
                identifier_id: None,
            })
            .await
            .unwrap_or_else(|e| panic!("fixture recharge failed: {}", e));
        ledger
            .transaction_settle(tx.id)
            .await
            .unwrap_or_else(|e| panic!("fixture settle failed: {}", e));
        ledger
            .user_get(user.id)
            .await
            .ok()
            .flatten()
            .unwrap_or(user)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for wallet-specific validation.

    use super::*;

    /// Assert exactly one identifier in `pool` is active and return it.
    #[track_caller]
    pub fn assert_single_active(pool: &[PaymentIdentifier]) -> &PaymentIdentifier {
        let active: Vec<&PaymentIdentifier> = pool.iter().filter(|i| i.active).collect();
        assert_eq!(active.len(), 1, "Expected exactly one active identifier, got {:?}", active);
        active[0]
    }

    /// Assert that a result is a `PoolEmpty` error.
    #[track_caller]
    pub fn assert_pool_empty<T: std::fmt::Debug>(result: &WalletResult<T>) {
        match result {
            Err(WalletError::Pool(PoolError::PoolEmpty)) => {}
            other => panic!("Expected PoolEmpty, got: {:?}", other),
        }
    }

    /// Assert that a result is a ledger error of any kind.
    #[track_caller]
    pub fn assert_ledger_error<T: std::fmt::Debug>(result: &WalletResult<T>) {
        match result {
            Err(WalletError::Ledger(_)) => {}
            other => panic!("Expected Ledger error, got: {:?}", other),
        }
    }
}
