//! Investment Service
//!
//! Fixed-return plans bought from the wallet balance and paid out daily.

use wallet_core::{Day, GrowthReport, Investment, InvestmentStats, LedgerError, UserId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::telemetry::metrics::with_metrics;
use crate::types::InvestRequest;

/// Buy a plan by name, debiting its price.
pub async fn invest(state: &AppState, user_id: UserId, req: InvestRequest) -> ApiResult<Investment> {
    let name = req.plan_name.trim();
    if name.is_empty() {
        return Err(ApiError::missing_field("planName"));
    }
    let plan = state.wallet.plan(name).ok_or_else(|| LedgerError::PlanNotFound {
        name: name.to_string(),
    })?;

    let investment = state.ledger.investment_open(user_id, plan).await?;
    tracing::info!(
        investment_id = %investment.id,
        plan = %investment.plan_name,
        amount = investment.amount,
        "Investment opened"
    );
    Ok(investment)
}

pub async fn user_investments(state: &AppState, user_id: UserId) -> ApiResult<Vec<Investment>> {
    Ok(state.ledger.investment_list_for_user(user_id).await?)
}

/// Pay one day of profit to every investment due on `day`.
///
/// Safe to run more than once per day; later runs pay nothing.
pub async fn process_daily_growth(state: &AppState, day: Day) -> ApiResult<GrowthReport> {
    let report = state.ledger.investment_apply_growth(day).await?;
    with_metrics(|m| m.record_growth_payouts(report.processed));
    tracing::info!(
        day = %day,
        processed = report.processed,
        completed = report.completed,
        credited = report.credited,
        "Daily growth processed"
    );
    Ok(report)
}

pub async fn investment_stats(state: &AppState) -> ApiResult<InvestmentStats> {
    Ok(state.ledger.investment_stats().await?)
}
