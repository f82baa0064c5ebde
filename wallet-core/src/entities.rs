//! Core entity structures

use crate::{
    Amount, Day, IdentifierId, InvestmentId, InvestmentStatus, Timestamp, TransactionId,
    TransactionKind, TransactionStatus, UserId,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// PAYMENT IDENTIFIER POOL
// ============================================================================

/// A merchant UPI handle in the rotation pool.
///
/// Rotation order is defined by `position`. At most one identifier in the
/// pool is active; `successful_payments` counts settlements since the last
/// activation and resets whenever the identifier becomes active again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaymentIdentifier {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: IdentifierId,
    pub handle: String,
    pub position: i32,
    pub active: bool,
    pub successful_payments: i32,
    pub max_payments_per_cycle: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl PaymentIdentifier {
    /// Whether the settlement counter has hit the per-cycle cap.
    pub fn cap_reached(&self) -> bool {
        self.successful_payments >= self.max_payments_per_cycle
    }

    /// Settlements left before this identifier rotates out.
    pub fn remaining_payments(&self) -> i32 {
        (self.max_payments_per_cycle - self.successful_payments).max(0)
    }
}

/// Aggregate view of the pool exposed to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub active: Option<PaymentIdentifier>,
    pub total_identifiers: i64,
    pub total_payments_across_pool: i64,
}

// ============================================================================
// USERS
// ============================================================================

/// A wallet account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: UserId,
    pub phone: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub balance: Amount,
    pub total_recharge: Amount,
    pub total_withdraw: Amount,
    pub total_welfare: Amount,
    pub referral_code: String,
    pub referred_by: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Input for creating a user; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub phone: String,
    pub password_hash: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// A recharge or withdrawal moving through the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: TransactionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub status: TransactionStatus,
    /// UTR submitted by the payer for recharges.
    pub reference_number: Option<String>,
    /// Payout destination for withdrawals.
    pub upi_id: Option<String>,
    /// Pool identifier the recharge was routed to.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub identifier_id: Option<IdentifierId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Input for recording a pending recharge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecharge {
    pub user_id: UserId,
    pub amount: Amount,
    pub identifier_id: Option<IdentifierId>,
}

/// Result of an admin approval: the completed transaction and the amount
/// credited to the owner (zero for withdrawals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub transaction: WalletTransaction,
    pub credited: Amount,
}

// ============================================================================
// CHECK-INS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: crate::EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub amount: Amount,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub checkin_date: Day,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

// ============================================================================
// INVESTMENTS
// ============================================================================

/// A fixed-return plan offered to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPlan {
    pub name: String,
    pub price: Amount,
    pub daily_profit: Amount,
    pub days: i32,
}

impl InvestmentPlan {
    /// Total payout over the life of the plan.
    pub fn total_return(&self) -> Amount {
        self.daily_profit * Amount::from(self.days)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: InvestmentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub plan_name: String,
    pub amount: Amount,
    pub daily_profit: Amount,
    /// Profit paid out so far.
    pub total_profit: Amount,
    pub days: i32,
    pub days_paid: i32,
    pub status: InvestmentStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub last_growth_on: Option<Day>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Investment {
    /// Whether a growth payout is due on `day`.
    pub fn growth_due(&self, day: Day) -> bool {
        self.status == InvestmentStatus::Active
            && self.days_paid < self.days
            && self.last_growth_on.is_none_or(|last| last < day)
    }
}

/// Summary of one daily growth run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GrowthReport {
    pub processed: i64,
    pub completed: i64,
    pub credited: Amount,
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_users: i64,
    pub total_balance: Amount,
    pub total_recharge: Amount,
    pub total_withdraw: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStats {
    pub active_investments: i64,
    pub total_invested: Amount,
    pub total_profit_paid: Amount,
}
