//! Async store for the payment identifier pool.

use ::async_trait::async_trait;
use wallet_core::{IdentifierId, PaymentIdentifier, PoolStats, WalletResult};

/// What must still hold for `expected` when a swap takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapCondition {
    /// `expected` is the active identifier.
    Active,
    /// `expected` is active and its counter is at or past its cap.
    ///
    /// A rotation resets the counter of the identifier it activates, so a
    /// second settlement that saw the same cap crossing finds the condition
    /// false even when the pool wrapped back onto `expected`.
    CapReached,
}

impl SwapCondition {
    pub fn holds(self, expected: &PaymentIdentifier) -> bool {
        match self {
            SwapCondition::Active => expected.active,
            SwapCondition::CapReached => expected.active && expected.cap_reached(),
        }
    }
}

/// Persistent pool of payment identifiers.
///
/// Every method is one atomic unit against the backend. The "current active"
/// identifier is always read from the store; implementations must never let
/// two identifiers be active at once, even transiently to other callers.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Add a new inactive identifier at `max(position) + 1` (1 on an empty
    /// pool). Fails with `PoolError::DuplicateHandle` before any mutation.
    async fn identifier_add(
        &self,
        handle: &str,
        max_payments_per_cycle: i32,
    ) -> WalletResult<PaymentIdentifier>;

    /// All identifiers ordered by position.
    async fn identifier_list(&self) -> WalletResult<Vec<PaymentIdentifier>>;

    async fn identifier_get(&self, id: IdentifierId) -> WalletResult<Option<PaymentIdentifier>>;

    /// Replace the handle of an identifier.
    async fn identifier_update_handle(
        &self,
        id: IdentifierId,
        handle: &str,
    ) -> WalletResult<PaymentIdentifier>;

    /// Delete an identifier unconditionally, active or not.
    async fn identifier_remove(&self, id: IdentifierId) -> WalletResult<PaymentIdentifier>;

    // ========================================================================
    // ROTATION PRIMITIVES
    // ========================================================================

    /// The active identifier, if any.
    async fn identifier_get_active(&self) -> WalletResult<Option<PaymentIdentifier>>;

    /// Activate `id` (counter reset) only if no identifier is active.
    ///
    /// Returns `None` when another caller won the race; the caller should
    /// re-read the active identifier.
    async fn identifier_activate_if_none(
        &self,
        id: IdentifierId,
    ) -> WalletResult<Option<PaymentIdentifier>>;

    /// Compare-and-swap the active identifier.
    ///
    /// Deactivates `expected` and activates `successor` with
    /// `successful_payments = 0` and a fresh `updated_at`, as one unit.
    /// Fails with `PoolError::RotationConflict` without any effect when
    /// `condition` no longer holds for `expected`, and with
    /// `PoolError::NotFound` when `successor` is gone. `expected == successor`
    /// re-activates in place.
    async fn identifier_swap_active(
        &self,
        expected: IdentifierId,
        successor: IdentifierId,
        condition: SwapCondition,
    ) -> WalletResult<PaymentIdentifier>;

    /// Atomically add one to `successful_payments` and refresh `updated_at`,
    /// returning the post-increment record.
    async fn identifier_increment_payments(
        &self,
        id: IdentifierId,
    ) -> WalletResult<PaymentIdentifier>;

    // ========================================================================
    // STATS
    // ========================================================================

    async fn identifier_stats(&self) -> WalletResult<PoolStats>;
}
