//! Payment Service
//!
//! Recharges are routed to the currently active payment identifier;
//! withdrawals debit the balance up front and wait for an admin.

use wallet_core::{format_rupees, NewRecharge, TransactionKind, UserId, WalletTransaction};

use crate::constants::USER_TRANSACTION_LIMIT;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{ConfirmRechargeRequest, RechargeRequest, RechargeResponse, WithdrawRequest};

/// Open a pending recharge against the active identifier.
///
/// An empty pool surfaces as a retryable 503.
pub async fn initiate_recharge(
    state: &AppState,
    user_id: UserId,
    req: RechargeRequest,
) -> ApiResult<RechargeResponse> {
    if req.amount <= 0 {
        return Err(ApiError::invalid_input("Invalid amount"));
    }
    let max_recharge = state.wallet.limits.max_recharge;
    if req.amount > max_recharge {
        return Err(ApiError::validation_failed(format!(
            "Maximum recharge amount is ₹{}",
            format_rupees(max_recharge)
        )));
    }

    let identifier = state.engine.get_active_or_bootstrap().await?;
    let transaction = state
        .ledger
        .transaction_create_recharge(NewRecharge {
            user_id,
            amount: req.amount,
            identifier_id: Some(identifier.id),
        })
        .await?;

    tracing::info!(
        transaction_id = %transaction.id,
        position = identifier.position,
        amount = req.amount,
        "Recharge initiated"
    );

    Ok(RechargeResponse {
        transaction_id: transaction.id,
        instructions: format!(
            "Pay ₹{} to {} and submit the UTR number to confirm",
            format_rupees(req.amount),
            identifier.handle
        ),
        upi_handle: identifier.handle,
        position: identifier.position,
        amount: req.amount,
    })
}

/// Attach the payer's reference number and hand the recharge to an admin.
pub async fn confirm_recharge(
    state: &AppState,
    user_id: UserId,
    req: ConfirmRechargeRequest,
) -> ApiResult<WalletTransaction> {
    let reference = req.reference_number.trim();
    if reference.is_empty() {
        return Err(ApiError::missing_field("referenceNumber"));
    }

    let transaction = state
        .ledger
        .transaction_confirm_recharge(req.transaction_id, user_id, reference)
        .await?;
    tracing::info!(transaction_id = %transaction.id, "Recharge submitted for verification");
    Ok(transaction)
}

/// Debit the balance and record a pending withdrawal.
pub async fn initiate_withdraw(
    state: &AppState,
    user_id: UserId,
    req: WithdrawRequest,
) -> ApiResult<WalletTransaction> {
    if req.amount <= 0 {
        return Err(ApiError::invalid_input("Invalid amount"));
    }
    let min_withdrawal = state.wallet.limits.min_withdrawal;
    if req.amount < min_withdrawal {
        return Err(ApiError::validation_failed(format!(
            "Minimum withdrawal amount is ₹{}",
            format_rupees(min_withdrawal)
        )));
    }
    let upi_id = req.upi_id.trim();
    if upi_id.is_empty() {
        return Err(ApiError::missing_field("upiId"));
    }

    let transaction = state
        .ledger
        .transaction_create_withdrawal(user_id, req.amount, upi_id)
        .await?;
    tracing::info!(
        transaction_id = %transaction.id,
        amount = req.amount,
        "Withdrawal requested"
    );
    Ok(transaction)
}

pub async fn user_transactions(
    state: &AppState,
    user_id: UserId,
) -> ApiResult<Vec<WalletTransaction>> {
    Ok(state
        .ledger
        .transaction_list_for_user(user_id, None, USER_TRANSACTION_LIMIT)
        .await?)
}

pub async fn user_withdrawals(
    state: &AppState,
    user_id: UserId,
) -> ApiResult<Vec<WalletTransaction>> {
    Ok(state
        .ledger
        .transaction_list_for_user(
            user_id,
            Some(TransactionKind::Withdraw),
            USER_TRANSACTION_LIMIT,
        )
        .await?)
}
