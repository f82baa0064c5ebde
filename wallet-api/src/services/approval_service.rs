//! Approval Service
//!
//! Admin decisions on pending transactions. Approving a recharge credits the
//! ledger first; identifier bookkeeping runs afterwards as a separate unit
//! and never undoes the credit.

use wallet_core::{
    IdentifierId, LedgerStats, TransactionKind, TransactionId, User, WalletError,
    WalletTransaction,
};

use crate::constants::ADMIN_TRANSACTION_LIMIT;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::telemetry::metrics::{with_metrics, RotationTrigger};
use crate::types::{ApprovalResponse, IdentifierBookkeeping};

/// Approve a pending transaction.
pub async fn approve(state: &AppState, transaction_id: TransactionId) -> ApiResult<ApprovalResponse> {
    let settlement = state.ledger.transaction_settle(transaction_id).await?;
    let transaction = settlement.transaction;
    with_metrics(|m| m.record_settlement(transaction.kind.as_str()));
    tracing::info!(
        transaction_id = %transaction.id,
        kind = %transaction.kind,
        credited = settlement.credited,
        "Transaction approved"
    );

    let bookkeeping = match transaction.kind {
        TransactionKind::Recharge => Some(settle_identifier(state, &transaction).await),
        TransactionKind::Withdraw => None,
    };

    Ok(ApprovalResponse {
        transaction,
        credited: settlement.credited,
        bookkeeping,
    })
}

/// Count the settled recharge against its identifier.
///
/// Failures are logged and counted; the committed credit stands.
async fn settle_identifier(state: &AppState, transaction: &WalletTransaction) -> IdentifierBookkeeping {
    let identifier_id = match resolve_identifier(state, transaction).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return bookkeeping_failed(transaction, "no_identifier", "No payment identifier to count against")
        }
        Err(e) => return bookkeeping_failed(transaction, failure_reason(&e), &e.to_string()),
    };

    match state.hook.on_recharge_settled(identifier_id).await {
        Ok(outcome) => {
            let rotated_to = match &outcome.rotation {
                Some(rotation) if rotation.rotated() => {
                    with_metrics(|m| m.record_rotation(RotationTrigger::Cap));
                    rotation.active().cloned()
                }
                _ => None,
            };
            IdentifierBookkeeping {
                identifier: Some(outcome.identifier),
                rotated_to,
                error: None,
            }
        }
        Err(e) => bookkeeping_failed(transaction, failure_reason(&e), &e.to_string()),
    }
}

/// The identifier the recharge was routed to, or the current active one
/// when that record is gone.
async fn resolve_identifier(
    state: &AppState,
    transaction: &WalletTransaction,
) -> Result<Option<IdentifierId>, WalletError> {
    if let Some(id) = transaction.identifier_id {
        return Ok(Some(id));
    }
    tracing::warn!(
        transaction_id = %transaction.id,
        "Recharge has no payment identifier, counting against the active one"
    );
    Ok(state
        .identifiers
        .identifier_get_active()
        .await?
        .map(|identifier| identifier.id))
}

fn bookkeeping_failed(
    transaction: &WalletTransaction,
    reason: &str,
    message: &str,
) -> IdentifierBookkeeping {
    tracing::error!(
        transaction_id = %transaction.id,
        identifier_id = ?transaction.identifier_id,
        reason,
        error = message,
        "Identifier bookkeeping failed after recharge credit"
    );
    with_metrics(|m| m.record_bookkeeping_failure(reason));
    IdentifierBookkeeping {
        identifier: None,
        rotated_to: None,
        error: Some(message.to_string()),
    }
}

fn failure_reason(err: &WalletError) -> &'static str {
    match err {
        WalletError::Pool(wallet_core::PoolError::NotFound { .. }) => "not_found",
        WalletError::Pool(_) => "pool",
        WalletError::Storage(_) => "storage",
        _ => "other",
    }
}

/// Reject a pending transaction; withdrawals are refunded.
pub async fn reject(state: &AppState, transaction_id: TransactionId) -> ApiResult<WalletTransaction> {
    let transaction = state.ledger.transaction_reject(transaction_id).await?;
    tracing::info!(
        transaction_id = %transaction.id,
        kind = %transaction.kind,
        "Transaction rejected"
    );
    Ok(transaction)
}

pub async fn pending_transactions(state: &AppState) -> ApiResult<Vec<WalletTransaction>> {
    Ok(state.ledger.transaction_list_pending(None).await?)
}

pub async fn pending_withdrawals(state: &AppState) -> ApiResult<Vec<WalletTransaction>> {
    Ok(state
        .ledger
        .transaction_list_pending(Some(TransactionKind::Withdraw))
        .await?)
}

pub async fn all_transactions(state: &AppState) -> ApiResult<Vec<WalletTransaction>> {
    Ok(state
        .ledger
        .transaction_list_all(ADMIN_TRANSACTION_LIMIT)
        .await?)
}

pub async fn all_users(state: &AppState) -> ApiResult<Vec<User>> {
    Ok(state.ledger.user_list().await?)
}

pub async fn ledger_stats(state: &AppState) -> ApiResult<LedgerStats> {
    Ok(state.ledger.ledger_stats().await?)
}
