//! Async store for users, transactions, check-ins and investments.

use ::async_trait::async_trait;
use wallet_core::{
    Amount, Checkin, Day, GrowthReport, Investment, InvestmentPlan, InvestmentStats,
    LedgerStats, NewRecharge, NewUser, Settlement, TransactionId, TransactionKind, User,
    UserId, WalletResult, WalletTransaction,
};

/// Ledger persistence.
///
/// Methods that touch a balance and a transaction row together are single
/// atomic units: either every write lands or none does.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Create a user with a zero balance. `LedgerError::DuplicatePhone` when
    /// the phone is taken.
    async fn user_create(&self, new_user: NewUser) -> WalletResult<User>;

    async fn user_get(&self, id: UserId) -> WalletResult<Option<User>>;

    async fn user_get_by_phone(&self, phone: &str) -> WalletResult<Option<User>>;

    /// All users, newest first.
    async fn user_list(&self) -> WalletResult<Vec<User>>;

    // ========================================================================
    // TRANSACTION OPERATIONS
    // ========================================================================

    /// Record a `pending` recharge.
    async fn transaction_create_recharge(
        &self,
        recharge: NewRecharge,
    ) -> WalletResult<WalletTransaction>;

    /// Debit the balance, bump `total_withdraw` and record a `pending`
    /// withdrawal. `LedgerError::InsufficientBalance` leaves everything as is.
    async fn transaction_create_withdrawal(
        &self,
        user_id: UserId,
        amount: Amount,
        upi_id: &str,
    ) -> WalletResult<WalletTransaction>;

    async fn transaction_get(&self, id: TransactionId) -> WalletResult<Option<WalletTransaction>>;

    /// Move the owner's `pending` recharge to `verification_pending` and
    /// store the payer's reference number.
    async fn transaction_confirm_recharge(
        &self,
        id: TransactionId,
        user_id: UserId,
        reference_number: &str,
    ) -> WalletResult<WalletTransaction>;

    /// Mark a `pending`/`verification_pending` transaction `completed`.
    /// Recharges credit `balance` and `total_recharge` in the same unit.
    async fn transaction_settle(&self, id: TransactionId) -> WalletResult<Settlement>;

    /// Mark a `pending`/`verification_pending` transaction `rejected`.
    /// Withdrawals are refunded in the same unit.
    async fn transaction_reject(&self, id: TransactionId) -> WalletResult<WalletTransaction>;

    /// A user's transactions, newest first, optionally of one kind only.
    async fn transaction_list_for_user(
        &self,
        user_id: UserId,
        kind: Option<TransactionKind>,
        limit: i64,
    ) -> WalletResult<Vec<WalletTransaction>>;

    /// All transactions, newest first.
    async fn transaction_list_all(&self, limit: i64) -> WalletResult<Vec<WalletTransaction>>;

    /// Transactions awaiting an admin decision, newest first, optionally of
    /// one kind only.
    async fn transaction_list_pending(
        &self,
        kind: Option<TransactionKind>,
    ) -> WalletResult<Vec<WalletTransaction>>;

    // ========================================================================
    // CHECK-IN OPERATIONS
    // ========================================================================

    /// Record the day's check-in and credit `amount` to `balance` and
    /// `total_welfare`. `LedgerError::AlreadyCheckedIn` on a second call.
    async fn checkin_record(
        &self,
        user_id: UserId,
        day: Day,
        amount: Amount,
    ) -> WalletResult<Checkin>;

    // ========================================================================
    // INVESTMENT OPERATIONS
    // ========================================================================

    /// Debit the plan price and open an `active` investment.
    async fn investment_open(
        &self,
        user_id: UserId,
        plan: &InvestmentPlan,
    ) -> WalletResult<Investment>;

    async fn investment_list_for_user(&self, user_id: UserId) -> WalletResult<Vec<Investment>>;

    /// Pay one day of profit to every investment due on `day` and complete
    /// those that reach their term. Running twice for the same day pays once.
    async fn investment_apply_growth(&self, day: Day) -> WalletResult<GrowthReport>;

    // ========================================================================
    // STATS
    // ========================================================================

    async fn ledger_stats(&self) -> WalletResult<LedgerStats>;

    async fn investment_stats(&self) -> WalletResult<InvestmentStats>;
}
