//! Enum types shared across the wallet crates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Entity type discriminator used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    PaymentIdentifier,
    User,
    Transaction,
    Checkin,
    Investment,
}

/// Kind of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Balance top-up paid externally to a pool identifier
    Recharge,
    /// Payout request debited from the balance up front
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Recharge => "recharge",
            TransactionKind::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recharge" => Ok(TransactionKind::Recharge),
            "withdraw" => Ok(TransactionKind::Withdraw),
            other => Err(ValidationError::InvalidValue {
                field: "type".to_string(),
                reason: format!("unknown transaction kind '{}'", other),
            }),
        }
    }
}

/// Lifecycle status of a ledger transaction.
///
/// `Pending -> VerificationPending -> Completed | Rejected`. Withdrawals skip
/// the verification step; both `Pending` and `VerificationPending` may be
/// settled or rejected by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    VerificationPending,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::VerificationPending => "verification_pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Rejected)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, VerificationPending)
                | (Pending, Completed)
                | (Pending, Rejected)
                | (VerificationPending, Completed)
                | (VerificationPending, Rejected)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "verification_pending" => Ok(TransactionStatus::VerificationPending),
            "completed" => Ok(TransactionStatus::Completed),
            "rejected" => Ok(TransactionStatus::Rejected),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: format!("unknown transaction status '{}'", other),
            }),
        }
    }
}

/// Status of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    Completed,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(InvestmentStatus::Active),
            "completed" => Ok(InvestmentStatus::Completed),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: format!("unknown investment status '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::VerificationPending,
            TransactionStatus::Completed,
            TransactionStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        use TransactionStatus::*;
        for next in [Pending, VerificationPending, Completed, Rejected] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn test_verification_pending_cannot_go_back() {
        use TransactionStatus::*;
        assert!(!VerificationPending.can_transition_to(Pending));
        assert!(VerificationPending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(VerificationPending));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!("deposit".parse::<TransactionKind>().is_err());
        assert_eq!("withdraw".parse::<TransactionKind>(), Ok(TransactionKind::Withdraw));
    }

    #[test]
    fn test_status_serializes_snake_case() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&TransactionStatus::VerificationPending)?;
        assert_eq!(json, "\"verification_pending\"");
        Ok(())
    }
}
