//! Rotation engine: active selection, bootstrap, rotation and pool admin.

use crate::successor::{first_in_rotation, successor};
use std::sync::Arc;
use wallet_core::{
    normalize_handle, IdentifierId, PaymentIdentifier, PoolError, PoolStats, RotationConfig,
    StorageError, ValidationError, WalletError, WalletResult,
};
use wallet_storage::{IdentifierStore, SwapCondition};

/// Bootstrap retries before giving up under contention.
const BOOTSTRAP_ATTEMPTS: usize = 3;

/// Result of a compare-and-swap rotation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// `from` was deactivated and `to` activated with a fresh counter.
    Rotated {
        from: PaymentIdentifier,
        to: PaymentIdentifier,
    },
    /// The expected identifier was no longer active, or no longer at its cap
    /// for a cap rotation; another caller already rotated. Nothing was
    /// changed.
    Superseded { current: Option<PaymentIdentifier> },
}

impl RotationOutcome {
    pub fn rotated(&self) -> bool {
        matches!(self, RotationOutcome::Rotated { .. })
    }

    /// The identifier active after the attempt.
    pub fn active(&self) -> Option<&PaymentIdentifier> {
        match self {
            RotationOutcome::Rotated { to, .. } => Some(to),
            RotationOutcome::Superseded { current } => current.as_ref(),
        }
    }
}

/// Selects and advances the active payment identifier.
///
/// Holds no state of its own: the active identifier is always read from the
/// store, so any number of engines may share one pool.
#[derive(Clone)]
pub struct RotationEngine {
    store: Arc<dyn IdentifierStore>,
    config: RotationConfig,
}

impl std::fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RotationEngine {
    pub fn new(store: Arc<dyn IdentifierStore>, config: RotationConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn IdentifierStore> {
        &self.store
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    // ========================================================================
    // ACTIVE SELECTION
    // ========================================================================

    /// Return the active identifier, activating the lowest position when the
    /// pool has none. `PoolError::PoolEmpty` on an empty pool.
    ///
    /// Safe to call concurrently: activation only succeeds while nothing is
    /// active, so racing callers converge on one identifier.
    pub async fn get_active_or_bootstrap(&self) -> WalletResult<PaymentIdentifier> {
        for _ in 0..BOOTSTRAP_ATTEMPTS {
            if let Some(active) = self.store.identifier_get_active().await? {
                return Ok(active);
            }

            let pool = self.store.identifier_list().await?;
            let first = first_in_rotation(&pool).ok_or(PoolError::PoolEmpty)?;
            match self.store.identifier_activate_if_none(first.id).await {
                Ok(Some(activated)) => {
                    tracing::warn!(
                        identifier_id = %activated.id,
                        position = activated.position,
                        "No active payment identifier, bootstrapped lowest position"
                    );
                    return Ok(activated);
                }
                // Lost the race, or the candidate was removed meanwhile.
                Ok(None) | Err(WalletError::Pool(PoolError::NotFound { .. })) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(WalletError::Storage(StorageError::TransactionFailed {
            reason: "payment identifier bootstrap did not converge".to_string(),
        }))
    }

    // ========================================================================
    // ROTATION
    // ========================================================================

    /// Advance to the successor of the current active identifier.
    ///
    /// Returns `None` without effect when nothing is active. When a
    /// concurrent caller rotates first this call is a no-op and returns the
    /// identifier that caller activated.
    pub async fn rotate(&self) -> WalletResult<Option<PaymentIdentifier>> {
        let Some(current) = self.store.identifier_get_active().await? else {
            return Ok(None);
        };
        let outcome = self.rotate_from(current.id).await?;
        Ok(outcome.active().cloned())
    }

    /// Rotate away from `expected` only if it is still the active identifier.
    pub async fn rotate_from(&self, expected: IdentifierId) -> WalletResult<RotationOutcome> {
        self.rotate_when(expected, SwapCondition::Active).await
    }

    /// Rotate away from `expected` only if it is still active and at or past
    /// its cap.
    ///
    /// Settlements that cross the cap together all call this; the first one
    /// resets the counter of the identifier it activates, so the rest are
    /// superseded even when the pool wraps back onto `expected`.
    pub async fn rotate_at_cap(&self, expected: IdentifierId) -> WalletResult<RotationOutcome> {
        self.rotate_when(expected, SwapCondition::CapReached).await
    }

    async fn rotate_when(
        &self,
        expected: IdentifierId,
        condition: SwapCondition,
    ) -> WalletResult<RotationOutcome> {
        let pool = self.store.identifier_list().await?;
        let current = match pool.iter().find(|identifier| identifier.id == expected) {
            Some(identifier) if condition.holds(identifier) => identifier.clone(),
            _ => return self.superseded().await,
        };
        let next = successor(&pool, current.position).ok_or(PoolError::PoolEmpty)?;

        match self
            .store
            .identifier_swap_active(current.id, next.id, condition)
            .await
        {
            Ok(to) => {
                tracing::info!(
                    from_position = current.position,
                    to_position = to.position,
                    from_handle = %current.handle,
                    to_handle = %to.handle,
                    "Payment identifier rotated"
                );
                Ok(RotationOutcome::Rotated { from: current, to })
            }
            Err(WalletError::Pool(PoolError::RotationConflict { .. })) => {
                tracing::debug!(identifier_id = %expected, "Rotation superseded by concurrent caller");
                self.superseded().await
            }
            Err(e) => Err(e),
        }
    }

    async fn superseded(&self) -> WalletResult<RotationOutcome> {
        Ok(RotationOutcome::Superseded {
            current: self.store.identifier_get_active().await?,
        })
    }

    // ========================================================================
    // POOL ADMINISTRATION
    // ========================================================================

    /// Add an identifier; `max_payments_per_cycle` falls back to the
    /// configured default.
    pub async fn add_identifier(
        &self,
        handle: &str,
        max_payments_per_cycle: Option<i32>,
    ) -> WalletResult<PaymentIdentifier> {
        let handle = normalize_handle(handle)?;
        let cap = max_payments_per_cycle.unwrap_or(self.config.default_max_payments_per_cycle);
        if cap <= 0 {
            return Err(WalletError::Validation(ValidationError::InvalidValue {
                field: "maxPaymentsPerCycle".to_string(),
                reason: "must be greater than 0".to_string(),
            }));
        }

        let identifier = self.store.identifier_add(&handle, cap).await?;
        tracing::info!(
            identifier_id = %identifier.id,
            position = identifier.position,
            "Payment identifier added"
        );
        Ok(identifier)
    }

    pub async fn list_identifiers(&self) -> WalletResult<Vec<PaymentIdentifier>> {
        self.store.identifier_list().await
    }

    pub async fn update_identifier(
        &self,
        id: IdentifierId,
        handle: &str,
    ) -> WalletResult<PaymentIdentifier> {
        let handle = normalize_handle(handle)?;
        self.store.identifier_update_handle(id, &handle).await
    }

    /// Remove an identifier from the pool.
    ///
    /// The active identifier is rotated away from first when other
    /// identifiers exist, so the pool never silently loses its active entry.
    /// A pool of one may be emptied.
    pub async fn retire_identifier(&self, id: IdentifierId) -> WalletResult<PaymentIdentifier> {
        let target = self
            .store
            .identifier_get(id)
            .await?
            .ok_or(PoolError::NotFound { id })?;

        if target.active {
            if let RotationOutcome::Rotated { to, .. } = self.rotate_from(id).await? {
                if to.id == id {
                    tracing::warn!(identifier_id = %id, "Removing the only payment identifier");
                }
            }
        }

        let removed = self.store.identifier_remove(id).await?;
        tracing::info!(
            identifier_id = %removed.id,
            position = removed.position,
            "Payment identifier removed"
        );
        Ok(removed)
    }

    pub async fn stats(&self) -> WalletResult<PoolStats> {
        self.store.identifier_stats().await
    }
}
