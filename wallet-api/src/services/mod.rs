//! Service Layer
//!
//! Business logic behind the route handlers. Services validate input,
//! call the stores and the rotation engine, and keep handlers thin.

mod account_service;
mod approval_service;
mod investment_service;
mod payment_service;

pub use account_service::*;
pub use approval_service::*;
pub use investment_service::*;
pub use payment_service::*;
