//! In-memory ledger.

use crate::LedgerStore;
use ::async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use wallet_core::{
    new_entity_id, Amount, Checkin, Day, GrowthReport, Investment, InvestmentId,
    InvestmentPlan, InvestmentStats, InvestmentStatus, LedgerError, LedgerStats, NewRecharge,
    NewUser, Settlement, StorageError, TransactionId, TransactionKind, TransactionStatus, User,
    UserId, WalletError, WalletResult, WalletTransaction,
};

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<UserId, User>,
    transactions: HashMap<TransactionId, WalletTransaction>,
    checkins: HashMap<(UserId, Day), Checkin>,
    investments: HashMap<InvestmentId, Investment>,
}

impl LedgerState {
    fn user_mut(&mut self, id: UserId) -> WalletResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or(WalletError::Ledger(LedgerError::UserNotFound { id }))
    }

    fn transaction(&self, id: TransactionId) -> WalletResult<&WalletTransaction> {
        self.transactions
            .get(&id)
            .ok_or(WalletError::Ledger(LedgerError::TransactionNotFound { id }))
    }

    /// Check that `id` may move to `next`, returning a copy of the row.
    fn decidable(
        &self,
        id: TransactionId,
        next: TransactionStatus,
    ) -> WalletResult<WalletTransaction> {
        let tx = self.transaction(id)?;
        if !tx.status.can_transition_to(next) {
            return Err(WalletError::Ledger(LedgerError::InvalidTransition {
                id,
                from: tx.status,
                to: next,
            }));
        }
        Ok(tx.clone())
    }

    fn set_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> WalletResult<WalletTransaction> {
        let tx = self
            .transactions
            .get_mut(&id)
            .ok_or(WalletError::Ledger(LedgerError::TransactionNotFound { id }))?;
        tx.status = status;
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }
}

/// Ledger held behind one lock; each trait call is a single atomic unit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> WalletResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| WalletError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> WalletResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| WalletError::Storage(StorageError::LockPoisoned))
    }
}

/// Unwrap a checked balance computation, failing before anything is written.
fn in_range(value: Option<Amount>, user_id: UserId) -> WalletResult<Amount> {
    value.ok_or(WalletError::Ledger(LedgerError::BalanceOverflow { id: user_id }))
}

fn total(values: impl Iterator<Item = Amount>) -> Amount {
    values.fold(0, Amount::saturating_add)
}

fn of_kind(tx: &WalletTransaction, kind: Option<TransactionKind>) -> bool {
    kind.is_none_or(|kind| tx.kind == kind)
}

fn newest_first(mut txs: Vec<WalletTransaction>, limit: i64) -> Vec<WalletTransaction> {
    txs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    txs.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    txs
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    // === User Operations ===

    async fn user_create(&self, new_user: NewUser) -> WalletResult<User> {
        let mut state = self.write()?;
        if state.users.values().any(|user| user.phone == new_user.phone) {
            return Err(WalletError::Ledger(LedgerError::DuplicatePhone));
        }
        let user = User {
            id: new_entity_id(),
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            balance: 0,
            total_recharge: 0,
            total_withdraw: 0,
            total_welfare: 0,
            referral_code: new_user.referral_code,
            referred_by: new_user.referred_by,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_get(&self, id: UserId) -> WalletResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn user_get_by_phone(&self, phone: &str) -> WalletResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.phone == phone)
            .cloned())
    }

    async fn user_list(&self) -> WalletResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    // === Transaction Operations ===

    async fn transaction_create_recharge(
        &self,
        recharge: NewRecharge,
    ) -> WalletResult<WalletTransaction> {
        let mut state = self.write()?;
        state.user_mut(recharge.user_id)?;
        let now = Utc::now();
        let tx = WalletTransaction {
            id: new_entity_id(),
            user_id: recharge.user_id,
            kind: TransactionKind::Recharge,
            amount: recharge.amount,
            status: TransactionStatus::Pending,
            reference_number: None,
            upi_id: None,
            identifier_id: recharge.identifier_id,
            created_at: now,
            updated_at: now,
        };
        state.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn transaction_create_withdrawal(
        &self,
        user_id: UserId,
        amount: Amount,
        upi_id: &str,
    ) -> WalletResult<WalletTransaction> {
        let mut state = self.write()?;
        let user = state.user_mut(user_id)?;
        if user.balance < amount {
            return Err(WalletError::Ledger(LedgerError::InsufficientBalance {
                available: user.balance,
                requested: amount,
            }));
        }
        let total_withdraw = in_range(user.total_withdraw.checked_add(amount), user_id)?;
        user.balance -= amount;
        user.total_withdraw = total_withdraw;

        let now = Utc::now();
        let tx = WalletTransaction {
            id: new_entity_id(),
            user_id,
            kind: TransactionKind::Withdraw,
            amount,
            status: TransactionStatus::Pending,
            reference_number: None,
            upi_id: Some(upi_id.to_string()),
            identifier_id: None,
            created_at: now,
            updated_at: now,
        };
        state.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn transaction_get(&self, id: TransactionId) -> WalletResult<Option<WalletTransaction>> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    async fn transaction_confirm_recharge(
        &self,
        id: TransactionId,
        user_id: UserId,
        reference_number: &str,
    ) -> WalletResult<WalletTransaction> {
        let mut state = self.write()?;
        let tx = state
            .transactions
            .get_mut(&id)
            .filter(|tx| tx.user_id == user_id && tx.kind == TransactionKind::Recharge)
            .ok_or(WalletError::Ledger(LedgerError::TransactionNotFound { id }))?;
        if tx.status != TransactionStatus::Pending {
            return Err(WalletError::Ledger(LedgerError::InvalidTransition {
                id,
                from: tx.status,
                to: TransactionStatus::VerificationPending,
            }));
        }
        tx.status = TransactionStatus::VerificationPending;
        tx.reference_number = Some(reference_number.to_string());
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    async fn transaction_settle(&self, id: TransactionId) -> WalletResult<Settlement> {
        let mut state = self.write()?;
        let tx = state.decidable(id, TransactionStatus::Completed)?;

        let credited = match tx.kind {
            TransactionKind::Recharge => {
                let user = state.user_mut(tx.user_id)?;
                let balance = in_range(user.balance.checked_add(tx.amount), user.id)?;
                let total_recharge = in_range(user.total_recharge.checked_add(tx.amount), user.id)?;
                user.balance = balance;
                user.total_recharge = total_recharge;
                tx.amount
            }
            TransactionKind::Withdraw => 0,
        };
        let transaction = state.set_status(id, TransactionStatus::Completed)?;
        Ok(Settlement {
            transaction,
            credited,
        })
    }

    async fn transaction_reject(&self, id: TransactionId) -> WalletResult<WalletTransaction> {
        let mut state = self.write()?;
        let tx = state.decidable(id, TransactionStatus::Rejected)?;

        if tx.kind == TransactionKind::Withdraw {
            let user = state.user_mut(tx.user_id)?;
            let balance = in_range(user.balance.checked_add(tx.amount), user.id)?;
            let total_withdraw = in_range(user.total_withdraw.checked_sub(tx.amount), user.id)?;
            user.balance = balance;
            user.total_withdraw = total_withdraw;
        }
        state.set_status(id, TransactionStatus::Rejected)
    }

    async fn transaction_list_for_user(
        &self,
        user_id: UserId,
        kind: Option<TransactionKind>,
        limit: i64,
    ) -> WalletResult<Vec<WalletTransaction>> {
        let txs = self
            .read()?
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id && of_kind(tx, kind))
            .cloned()
            .collect();
        Ok(newest_first(txs, limit))
    }

    async fn transaction_list_all(&self, limit: i64) -> WalletResult<Vec<WalletTransaction>> {
        let txs = self.read()?.transactions.values().cloned().collect();
        Ok(newest_first(txs, limit))
    }

    async fn transaction_list_pending(
        &self,
        kind: Option<TransactionKind>,
    ) -> WalletResult<Vec<WalletTransaction>> {
        let txs = self
            .read()?
            .transactions
            .values()
            .filter(|tx| !tx.status.is_terminal() && of_kind(tx, kind))
            .cloned()
            .collect();
        Ok(newest_first(txs, i64::MAX))
    }

    // === Check-in Operations ===

    async fn checkin_record(
        &self,
        user_id: UserId,
        day: Day,
        amount: Amount,
    ) -> WalletResult<Checkin> {
        let mut state = self.write()?;
        if state.checkins.contains_key(&(user_id, day)) {
            return Err(WalletError::Ledger(LedgerError::AlreadyCheckedIn));
        }
        let user = state.user_mut(user_id)?;
        let balance = in_range(user.balance.checked_add(amount), user_id)?;
        let total_welfare = in_range(user.total_welfare.checked_add(amount), user_id)?;
        user.balance = balance;
        user.total_welfare = total_welfare;

        let checkin = Checkin {
            id: new_entity_id(),
            user_id,
            amount,
            checkin_date: day,
            created_at: Utc::now(),
        };
        state.checkins.insert((user_id, day), checkin.clone());
        Ok(checkin)
    }

    // === Investment Operations ===

    async fn investment_open(
        &self,
        user_id: UserId,
        plan: &InvestmentPlan,
    ) -> WalletResult<Investment> {
        let mut state = self.write()?;
        let user = state.user_mut(user_id)?;
        if user.balance < plan.price {
            return Err(WalletError::Ledger(LedgerError::InsufficientBalance {
                available: user.balance,
                requested: plan.price,
            }));
        }
        user.balance -= plan.price;

        let investment = Investment {
            id: new_entity_id(),
            user_id,
            plan_name: plan.name.clone(),
            amount: plan.price,
            daily_profit: plan.daily_profit,
            total_profit: 0,
            days: plan.days,
            days_paid: 0,
            status: InvestmentStatus::Active,
            last_growth_on: None,
            created_at: Utc::now(),
        };
        state.investments.insert(investment.id, investment.clone());
        Ok(investment)
    }

    async fn investment_list_for_user(&self, user_id: UserId) -> WalletResult<Vec<Investment>> {
        let mut investments: Vec<Investment> = self
            .read()?
            .investments
            .values()
            .filter(|investment| investment.user_id == user_id)
            .cloned()
            .collect();
        investments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(investments)
    }

    async fn investment_apply_growth(&self, day: Day) -> WalletResult<GrowthReport> {
        let mut state = self.write()?;
        let due: Vec<InvestmentId> = state
            .investments
            .values()
            .filter(|investment| investment.growth_due(day))
            .map(|investment| investment.id)
            .collect();

        let mut report = GrowthReport::default();
        for id in due {
            let Some(investment) = state.investments.get(&id) else {
                continue;
            };
            let (user_id, profit) = (investment.user_id, investment.daily_profit);
            let total_profit = in_range(investment.total_profit.checked_add(profit), user_id)?;

            // Skipped payouts stay due and are retried by the next run.
            let user = state.user_mut(user_id)?;
            let Some(balance) = user.balance.checked_add(profit) else {
                tracing::warn!(
                    user_id = %user_id,
                    investment_id = %id,
                    "Growth credit skipped on balance overflow"
                );
                continue;
            };
            user.balance = balance;

            let Some(investment) = state.investments.get_mut(&id) else {
                continue;
            };
            investment.days_paid += 1;
            investment.total_profit = total_profit;
            investment.last_growth_on = Some(day);
            if investment.days_paid >= investment.days {
                investment.status = InvestmentStatus::Completed;
                report.completed += 1;
            }
            report.processed += 1;
            report.credited = report.credited.saturating_add(profit);
        }
        Ok(report)
    }

    // === Stats ===

    async fn ledger_stats(&self) -> WalletResult<LedgerStats> {
        let state = self.read()?;
        Ok(LedgerStats {
            total_users: state.users.len() as i64,
            total_balance: total(state.users.values().map(|user| user.balance)),
            total_recharge: total(state.users.values().map(|user| user.total_recharge)),
            total_withdraw: total(state.users.values().map(|user| user.total_withdraw)),
        })
    }

    async fn investment_stats(&self) -> WalletResult<InvestmentStats> {
        let state = self.read()?;
        Ok(InvestmentStats {
            active_investments: state
                .investments
                .values()
                .filter(|investment| investment.status == InvestmentStatus::Active)
                .count() as i64,
            total_invested: total(state.investments.values().map(|i| i.amount)),
            total_profit_paid: total(state.investments.values().map(|i| i.total_profit)),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn ledger_with_user() -> (InMemoryLedger, User) {
        let ledger = InMemoryLedger::new();
        let user = ledger
            .user_create(NewUser {
                phone: "9876543210".to_string(),
                password_hash: "salt$hash".to_string(),
                referral_code: "ABC123".to_string(),
                referred_by: None,
            })
            .await
            .unwrap();
        (ledger, user)
    }

    async fn funded(ledger: &InMemoryLedger, user: &User, amount: Amount) {
        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount,
                identifier_id: None,
            })
            .await
            .unwrap();
        ledger.transaction_settle(tx.id).await.unwrap();
    }

    fn day(d: u32) -> Day {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let (ledger, user) = ledger_with_user().await;
        let err = ledger
            .user_create(NewUser {
                phone: user.phone.clone(),
                password_hash: "x".to_string(),
                referral_code: "ZZZ999".to_string(),
                referred_by: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Ledger(LedgerError::DuplicatePhone));
    }

    #[tokio::test]
    async fn test_settle_recharge_credits_balance_once() {
        let (ledger, user) = ledger_with_user().await;
        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: 50_000,
                identifier_id: None,
            })
            .await
            .unwrap();
        ledger
            .transaction_confirm_recharge(tx.id, user.id, "UTR123456")
            .await
            .unwrap();

        let settlement = ledger.transaction_settle(tx.id).await.unwrap();
        assert_eq!(settlement.credited, 50_000);
        assert_eq!(settlement.transaction.status, TransactionStatus::Completed);

        let again = ledger.transaction_settle(tx.id).await.unwrap_err();
        assert!(matches!(
            again,
            WalletError::Ledger(LedgerError::InvalidTransition { .. })
        ));

        let user = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 50_000);
        assert_eq!(user.total_recharge, 50_000);
    }

    #[tokio::test]
    async fn test_confirm_requires_owner_and_pending() {
        let (ledger, user) = ledger_with_user().await;
        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: 1_000,
                identifier_id: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            ledger
                .transaction_confirm_recharge(tx.id, new_entity_id(), "UTR")
                .await,
            Err(WalletError::Ledger(LedgerError::TransactionNotFound { .. }))
        ));

        ledger
            .transaction_confirm_recharge(tx.id, user.id, "UTR")
            .await
            .unwrap();
        assert!(matches!(
            ledger.transaction_confirm_recharge(tx.id, user.id, "UTR").await,
            Err(WalletError::Ledger(LedgerError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_withdrawal_debits_and_rejection_refunds() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, 10_000).await;

        let tx = ledger
            .transaction_create_withdrawal(user.id, 4_000, "me@upi")
            .await
            .unwrap();
        let after_debit = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(after_debit.balance, 6_000);
        assert_eq!(after_debit.total_withdraw, 4_000);

        ledger.transaction_reject(tx.id).await.unwrap();
        let refunded = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(refunded.balance, 10_000);
        assert_eq!(refunded.total_withdraw, 0);
    }

    #[tokio::test]
    async fn test_withdrawal_over_balance_has_no_effect() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, 1_000).await;

        let err = ledger
            .transaction_create_withdrawal(user.id, 5_000, "me@upi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
        let user = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 1_000);
        assert_eq!(
            ledger.transaction_list_pending(None).await.unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn test_rejecting_recharge_does_not_touch_balance() {
        let (ledger, user) = ledger_with_user().await;
        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: 7_500,
                identifier_id: None,
            })
            .await
            .unwrap();
        ledger.transaction_reject(tx.id).await.unwrap();
        let user = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 0);
    }

    #[tokio::test]
    async fn test_checkin_once_per_day() {
        let (ledger, user) = ledger_with_user().await;
        ledger.checkin_record(user.id, day(5), 2_000).await.unwrap();
        assert_eq!(
            ledger.checkin_record(user.id, day(5), 2_000).await.unwrap_err(),
            WalletError::Ledger(LedgerError::AlreadyCheckedIn)
        );
        ledger.checkin_record(user.id, day(6), 1_500).await.unwrap();

        let user = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 3_500);
        assert_eq!(user.total_welfare, 3_500);
    }

    #[tokio::test]
    async fn test_growth_pays_once_per_day_and_completes() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, 10_000).await;
        let plan = InvestmentPlan {
            name: "Short".to_string(),
            price: 10_000,
            daily_profit: 600,
            days: 2,
        };
        ledger.investment_open(user.id, &plan).await.unwrap();

        let first = ledger.investment_apply_growth(day(1)).await.unwrap();
        assert_eq!(first.processed, 1);
        let repeat = ledger.investment_apply_growth(day(1)).await.unwrap();
        assert_eq!(repeat.processed, 0);
        let last = ledger.investment_apply_growth(day(2)).await.unwrap();
        assert_eq!(last.completed, 1);
        let after = ledger.investment_apply_growth(day(3)).await.unwrap();
        assert_eq!(after.processed, 0);

        let investments = ledger.investment_list_for_user(user.id).await.unwrap();
        assert_eq!(investments[0].status, InvestmentStatus::Completed);
        assert_eq!(investments[0].total_profit, 1_200);
        let user = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, 1_200);
    }

    #[tokio::test]
    async fn test_overflowing_credit_is_refused_without_poisoning() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, i64::MAX).await;

        let tx = ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: 1,
                identifier_id: None,
            })
            .await
            .unwrap();
        assert_eq!(
            ledger.transaction_settle(tx.id).await.unwrap_err(),
            WalletError::Ledger(LedgerError::BalanceOverflow { id: user.id })
        );
        assert_eq!(
            ledger.checkin_record(user.id, day(1), 500).await.unwrap_err(),
            WalletError::Ledger(LedgerError::BalanceOverflow { id: user.id })
        );

        // Nothing moved and the ledger still serves reads and writes.
        let stored = ledger.user_get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, i64::MAX);
        assert_eq!(stored.total_welfare, 0);
        assert_eq!(
            ledger.transaction_get(tx.id).await.unwrap().unwrap().status,
            TransactionStatus::Pending
        );
        ledger.transaction_reject(tx.id).await.unwrap();
        ledger.checkin_record(user.id, day(1), 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_growth_skips_credit_that_would_overflow() {
        let (ledger, user) = ledger_with_user().await;
        let plan = InvestmentPlan {
            name: "Free".to_string(),
            price: 0,
            daily_profit: 600,
            days: 2,
        };
        ledger.investment_open(user.id, &plan).await.unwrap();
        funded(&ledger, &user, i64::MAX - 100).await;

        let report = ledger.investment_apply_growth(day(1)).await.unwrap();
        assert_eq!(report.processed, 0);
        let investments = ledger.investment_list_for_user(user.id).await.unwrap();
        assert_eq!(investments[0].days_paid, 0);
        assert_eq!(investments[0].total_profit, 0);
    }

    #[tokio::test]
    async fn test_transactions_newest_first_with_limit() {
        let (ledger, user) = ledger_with_user().await;
        let mut ids = Vec::new();
        for amount in [100, 200, 300] {
            let tx = ledger
                .transaction_create_recharge(NewRecharge {
                    user_id: user.id,
                    amount,
                    identifier_id: None,
                })
                .await
                .unwrap();
            ids.push(tx.id);
        }
        let listed = ledger.transaction_list_for_user(user.id, None, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
    }

    #[tokio::test]
    async fn test_listings_filter_by_kind() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, 90_000).await;
        ledger
            .transaction_create_recharge(NewRecharge {
                user_id: user.id,
                amount: 5_000,
                identifier_id: None,
            })
            .await
            .unwrap();
        let withdrawal = ledger
            .transaction_create_withdrawal(user.id, 40_000, "me@upi")
            .await
            .unwrap();

        let withdrawals = ledger
            .transaction_list_for_user(user.id, Some(TransactionKind::Withdraw), 50)
            .await
            .unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].id, withdrawal.id);
        assert_eq!(
            ledger
                .transaction_list_for_user(user.id, Some(TransactionKind::Recharge), 50)
                .await
                .unwrap()
                .len(),
            2
        );

        let pending = ledger.transaction_list_pending(None).await.unwrap();
        assert_eq!(pending.len(), 2);
        let pending_withdrawals = ledger
            .transaction_list_pending(Some(TransactionKind::Withdraw))
            .await
            .unwrap();
        assert_eq!(pending_withdrawals.len(), 1);
        assert_eq!(pending_withdrawals[0].id, withdrawal.id);
    }

    #[tokio::test]
    async fn test_ledger_stats_totals() {
        let (ledger, user) = ledger_with_user().await;
        funded(&ledger, &user, 9_000).await;
        ledger
            .transaction_create_withdrawal(user.id, 2_000, "me@upi")
            .await
            .unwrap();
        let stats = ledger.ledger_stats().await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_balance, 7_000);
        assert_eq!(stats.total_recharge, 9_000);
        assert_eq!(stats.total_withdraw, 2_000);
    }
}
