//! Payment settlement hook.

use crate::{RotationEngine, RotationOutcome};
use wallet_core::{IdentifierId, PaymentIdentifier, WalletResult};

/// Bookkeeping performed for one settled recharge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// The identifier after its counter was incremented.
    pub identifier: PaymentIdentifier,
    /// Present when the cap was reached on the active identifier.
    pub rotation: Option<RotationOutcome>,
}

impl SettlementOutcome {
    pub fn rotated(&self) -> bool {
        self.rotation.as_ref().is_some_and(RotationOutcome::rotated)
    }
}

/// Counts settled recharges against their identifier and rotates the pool
/// when the active identifier reaches its cap.
///
/// Runs after the ledger credit has committed and never touches balances.
/// Callers invoke it once per settled recharge.
#[derive(Debug, Clone)]
pub struct SettlementHook {
    engine: RotationEngine,
}

impl SettlementHook {
    pub fn new(engine: RotationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RotationEngine {
        &self.engine
    }

    /// Increment the identifier's counter and rotate if it hit the cap.
    ///
    /// Only a still-active identifier triggers rotation, and rotation is a
    /// compare-and-swap on "active and at cap" for that identifier, so
    /// concurrent settlements crossing the cap together advance the pool
    /// exactly once.
    pub async fn on_recharge_settled(
        &self,
        identifier_id: IdentifierId,
    ) -> WalletResult<SettlementOutcome> {
        let identifier = self
            .engine
            .store()
            .identifier_increment_payments(identifier_id)
            .await?;

        if !identifier.active {
            tracing::info!(
                position = identifier.position,
                successful_payments = identifier.successful_payments,
                "Settlement counted against inactive payment identifier"
            );
            return Ok(SettlementOutcome {
                identifier,
                rotation: None,
            });
        }

        if !identifier.cap_reached() {
            tracing::info!(
                position = identifier.position,
                "Payment identifier now has {}/{} payments",
                identifier.successful_payments,
                identifier.max_payments_per_cycle
            );
            return Ok(SettlementOutcome {
                identifier,
                rotation: None,
            });
        }

        tracing::info!(
            position = identifier.position,
            successful_payments = identifier.successful_payments,
            "Payment identifier reached its cap, rotating"
        );
        let rotation = self.engine.rotate_at_cap(identifier.id).await?;
        Ok(SettlementOutcome {
            identifier,
            rotation: Some(rotation),
        })
    }
}
