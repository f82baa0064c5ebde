//! Wallet Rotation - Payment Identifier Rotation
//!
//! Cycles recharges through a pool of merchant UPI handles so that no
//! handle receives more than its cap of settled payments before the next
//! one takes over, wrapping around by position.
//!
//! - [`RotationEngine`] selects, bootstraps and advances the active
//!   identifier and administers the pool.
//! - [`SettlementHook`] counts settled recharges and asks the engine to
//!   advance when the cap is reached.
//! - [`successor`] is the pure ordering rule both rely on.

pub mod engine;
pub mod settlement;
pub mod successor;

pub use engine::{RotationEngine, RotationOutcome};
pub use settlement::{SettlementHook, SettlementOutcome};
pub use successor::{first_in_rotation, successor};
