//! Background Jobs for the Wallet API
//!
//! - `daily_growth`: pays investment profit once per calendar day
//!
//! # Usage
//!
//! ```ignore
//! use wallet_api::jobs::{daily_growth_task, DailyGrowthConfig};
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! tokio::spawn(daily_growth_task(state.ledger.clone(), DailyGrowthConfig::from_env(), shutdown_rx));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! ```

pub mod daily_growth;

pub use daily_growth::{daily_growth_task, DailyGrowthConfig, DailyGrowthMetrics, DailyGrowthSnapshot};
