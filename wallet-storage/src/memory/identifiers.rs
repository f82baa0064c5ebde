//! In-memory identifier pool.

use crate::{IdentifierStore, SwapCondition};
use ::async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use wallet_core::{
    new_entity_id, IdentifierId, PaymentIdentifier, PoolError, PoolStats, StorageError,
    WalletError, WalletResult,
};

/// Pool held behind a single lock so every operation is one atomic unit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentifierStore {
    identifiers: Arc<RwLock<HashMap<IdentifierId, PaymentIdentifier>>>,
}

impl InMemoryIdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers currently in the pool.
    pub fn len(&self) -> usize {
        self.identifiers.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> WalletResult<RwLockReadGuard<'_, HashMap<IdentifierId, PaymentIdentifier>>> {
        self.identifiers
            .read()
            .map_err(|_| WalletError::Storage(StorageError::LockPoisoned))
    }

    fn write(
        &self,
    ) -> WalletResult<RwLockWriteGuard<'_, HashMap<IdentifierId, PaymentIdentifier>>> {
        self.identifiers
            .write()
            .map_err(|_| WalletError::Storage(StorageError::LockPoisoned))
    }
}

fn not_found(id: IdentifierId) -> WalletError {
    WalletError::Pool(PoolError::NotFound { id })
}

fn sorted(map: &HashMap<IdentifierId, PaymentIdentifier>) -> Vec<PaymentIdentifier> {
    let mut all: Vec<PaymentIdentifier> = map.values().cloned().collect();
    all.sort_by_key(|identifier| identifier.position);
    all
}

#[async_trait]
impl IdentifierStore for InMemoryIdentifierStore {
    async fn identifier_add(
        &self,
        handle: &str,
        max_payments_per_cycle: i32,
    ) -> WalletResult<PaymentIdentifier> {
        let mut identifiers = self.write()?;
        if identifiers.values().any(|existing| existing.handle == handle) {
            return Err(WalletError::Pool(PoolError::DuplicateHandle {
                handle: handle.to_string(),
            }));
        }

        let position = identifiers
            .values()
            .map(|existing| existing.position)
            .max()
            .map_or(1, |max| max + 1);
        let now = Utc::now();
        let identifier = PaymentIdentifier {
            id: new_entity_id(),
            handle: handle.to_string(),
            position,
            active: false,
            successful_payments: 0,
            max_payments_per_cycle,
            created_at: now,
            updated_at: now,
        };
        identifiers.insert(identifier.id, identifier.clone());
        Ok(identifier)
    }

    async fn identifier_list(&self) -> WalletResult<Vec<PaymentIdentifier>> {
        Ok(sorted(&*self.read()?))
    }

    async fn identifier_get(&self, id: IdentifierId) -> WalletResult<Option<PaymentIdentifier>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn identifier_update_handle(
        &self,
        id: IdentifierId,
        handle: &str,
    ) -> WalletResult<PaymentIdentifier> {
        let mut identifiers = self.write()?;
        if !identifiers.contains_key(&id) {
            return Err(not_found(id));
        }
        if identifiers
            .values()
            .any(|existing| existing.id != id && existing.handle == handle)
        {
            return Err(WalletError::Pool(PoolError::DuplicateHandle {
                handle: handle.to_string(),
            }));
        }

        let identifier = identifiers.get_mut(&id).ok_or_else(|| not_found(id))?;
        identifier.handle = handle.to_string();
        identifier.updated_at = Utc::now();
        Ok(identifier.clone())
    }

    async fn identifier_remove(&self, id: IdentifierId) -> WalletResult<PaymentIdentifier> {
        self.write()?.remove(&id).ok_or_else(|| not_found(id))
    }

    async fn identifier_get_active(&self) -> WalletResult<Option<PaymentIdentifier>> {
        Ok(self
            .read()?
            .values()
            .find(|identifier| identifier.active)
            .cloned())
    }

    async fn identifier_activate_if_none(
        &self,
        id: IdentifierId,
    ) -> WalletResult<Option<PaymentIdentifier>> {
        let mut identifiers = self.write()?;
        if identifiers.values().any(|identifier| identifier.active) {
            return Ok(None);
        }

        let identifier = identifiers.get_mut(&id).ok_or_else(|| not_found(id))?;
        identifier.active = true;
        identifier.successful_payments = 0;
        identifier.updated_at = Utc::now();
        Ok(Some(identifier.clone()))
    }

    async fn identifier_swap_active(
        &self,
        expected: IdentifierId,
        successor: IdentifierId,
        condition: SwapCondition,
    ) -> WalletResult<PaymentIdentifier> {
        let mut identifiers = self.write()?;

        // Validate both sides before touching anything.
        match identifiers.get(&expected) {
            Some(current) if condition.holds(current) => {}
            _ => return Err(WalletError::Pool(PoolError::RotationConflict { expected })),
        }
        if !identifiers.contains_key(&successor) {
            return Err(not_found(successor));
        }

        let now = Utc::now();
        if let Some(current) = identifiers.get_mut(&expected) {
            current.active = false;
            current.updated_at = now;
        }
        let next = identifiers
            .get_mut(&successor)
            .ok_or_else(|| not_found(successor))?;
        next.active = true;
        next.successful_payments = 0;
        next.updated_at = now;
        Ok(next.clone())
    }

    async fn identifier_increment_payments(
        &self,
        id: IdentifierId,
    ) -> WalletResult<PaymentIdentifier> {
        let mut identifiers = self.write()?;
        let identifier = identifiers.get_mut(&id).ok_or_else(|| not_found(id))?;
        identifier.successful_payments = identifier
            .successful_payments
            .checked_add(1)
            .ok_or_else(|| {
                WalletError::Storage(StorageError::Backend {
                    reason: format!("payment counter of identifier {} is saturated", id),
                })
            })?;
        identifier.updated_at = Utc::now();
        Ok(identifier.clone())
    }

    async fn identifier_stats(&self) -> WalletResult<PoolStats> {
        let identifiers = self.read()?;
        Ok(PoolStats {
            active: identifiers.values().find(|identifier| identifier.active).cloned(),
            total_identifiers: identifiers.len() as i64,
            total_payments_across_pool: identifiers
                .values()
                .map(|identifier| i64::from(identifier.successful_payments))
                .sum(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
