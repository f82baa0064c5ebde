//! Identity types for wallet entities

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Identifier of a registered wallet user.
pub type UserId = EntityId;

/// Identifier of a payment identifier (UPI handle) in the rotation pool.
pub type IdentifierId = EntityId;

/// Identifier of a ledger transaction (recharge or withdrawal).
pub type TransactionId = EntityId;

/// Identifier of an investment held by a user.
pub type InvestmentId = EntityId;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Calendar day used for check-ins and daily growth.
pub type Day = NaiveDate;

/// Monetary amount in minor units (paise). Never a float.
pub type Amount = i64;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Current UTC calendar day.
pub fn today_utc() -> Day {
    Utc::now().date_naive()
}
