//! Daily Growth Background Task
//!
//! Periodically applies one day of profit to active investments. The ledger
//! only pays an investment once per calendar day, so the check interval can
//! be much shorter than a day without double payouts.

use crate::constants::DEFAULT_GROWTH_CHECK_INTERVAL_SECS;
use crate::telemetry::metrics::with_metrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use wallet_core::today_utc;
use wallet_storage::LedgerStore;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct DailyGrowthConfig {
    /// How often to look for due payouts (default: 1 hour)
    pub check_interval: Duration,
    /// Whether the task runs at all (default: true)
    pub enabled: bool,
}

impl Default for DailyGrowthConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_GROWTH_CHECK_INTERVAL_SECS),
            enabled: true,
        }
    }
}

impl DailyGrowthConfig {
    /// - `WALLET_GROWTH_CHECK_INTERVAL_SECS` (default: 3600)
    /// - `WALLET_GROWTH_ENABLED` (default: true)
    pub fn from_env() -> Self {
        let check_interval = Duration::from_secs(
            std::env::var("WALLET_GROWTH_CHECK_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_GROWTH_CHECK_INTERVAL_SECS),
        );

        let enabled = std::env::var("WALLET_GROWTH_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            check_interval,
            enabled,
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Default)]
pub struct DailyGrowthMetrics {
    /// Completed growth runs
    pub runs: AtomicU64,
    /// Investments paid across all runs
    pub payouts: AtomicU64,
    /// Investments that reached their term
    pub completed: AtomicU64,
    /// Runs that failed
    pub errors: AtomicU64,
}

impl DailyGrowthMetrics {
    pub fn snapshot(&self) -> DailyGrowthSnapshot {
        DailyGrowthSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            payouts: self.payouts.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyGrowthSnapshot {
    pub runs: u64,
    pub payouts: u64,
    pub completed: u64,
    pub errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run daily growth on every tick until the shutdown signal flips to `true`.
///
/// Returns the metrics collected over the task's lifetime.
pub async fn daily_growth_task(
    ledger: Arc<dyn LedgerStore>,
    config: DailyGrowthConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<DailyGrowthMetrics> {
    let metrics = Arc::new(DailyGrowthMetrics::default());
    if !config.enabled {
        tracing::info!("Daily growth task disabled");
        return metrics;
    }

    let mut ticker = interval(config.check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        check_interval_secs = config.check_interval.as_secs(),
        "Daily growth task started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Daily growth task shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                run_once(ledger.as_ref(), &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        runs = snapshot.runs,
        payouts = snapshot.payouts,
        completed = snapshot.completed,
        errors = snapshot.errors,
        "Daily growth task completed"
    );

    metrics
}

async fn run_once(ledger: &dyn LedgerStore, metrics: &DailyGrowthMetrics) {
    let day = today_utc();
    match ledger.investment_apply_growth(day).await {
        Ok(report) => {
            metrics.runs.fetch_add(1, Ordering::Relaxed);
            metrics
                .payouts
                .fetch_add(report.processed.max(0) as u64, Ordering::Relaxed);
            metrics
                .completed
                .fetch_add(report.completed.max(0) as u64, Ordering::Relaxed);
            with_metrics(|m| m.record_growth_payouts(report.processed));

            if report.processed > 0 {
                tracing::info!(
                    day = %day,
                    processed = report.processed,
                    completed = report.completed,
                    credited = report.credited,
                    "Daily growth applied"
                );
            } else {
                tracing::trace!(day = %day, "No investments due for growth");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, day = %day, "Daily growth run failed");
            metrics.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}
