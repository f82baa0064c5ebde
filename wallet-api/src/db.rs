//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! PostgreSQL implementations of the identifier pool and ledger stores.
//!
//! Every store method runs as a single statement or inside one database
//! transaction, so each is an atomic unit. The partial unique index on
//! `payment_identifiers (active)` backs the single-active invariant.

use crate::error::{ApiError, ApiResult};
use ::async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use wallet_core::{
    new_entity_id, Amount, Checkin, Day, GrowthReport, IdentifierId, Investment,
    InvestmentPlan, InvestmentStats, InvestmentStatus, LedgerError, LedgerStats, NewRecharge,
    NewUser, PaymentIdentifier, PoolError, PoolStats, Settlement, StorageError, TransactionId,
    TransactionKind, TransactionStatus, User, UserId, WalletError, WalletResult,
    WalletTransaction,
};
use wallet_storage::{IdentifierStore, LedgerStore, SwapCondition};

/// Embedded schema, applied by [`DbClient::apply_schema`].
pub const SCHEMA_SQL: &str = include_str!("../schema.sql");

const IDENTIFIER_COLUMNS: &str =
    "id, handle, position, active, successful_payments, max_payments_per_cycle, created_at, updated_at";

const USER_COLUMNS: &str = "id, phone, password_hash, balance, total_recharge, total_withdraw, \
     total_welfare, referral_code, referred_by, created_at";

const TRANSACTION_COLUMNS: &str = "id, user_id, kind, amount, status, reference_number, upi_id, \
     identifier_id, created_at, updated_at";

const INVESTMENT_COLUMNS: &str = "id, user_id, plan_name, amount, daily_profit, total_profit, \
     days, days_paid, status, last_growth_on, created_at";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "wallet".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("WALLET_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("WALLET_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("WALLET_DB_NAME").unwrap_or_else(|_| "wallet".to_string()),
            user: std::env::var("WALLET_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("WALLET_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("WALLET_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("WALLET_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.max_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// PostgreSQL-backed identifier pool and ledger.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> WalletResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            WalletError::Storage(StorageError::Backend {
                reason: format!("connection pool: {}", e),
            })
        })
    }

    /// Create tables and indexes if they do not exist.
    pub async fn apply_schema(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    /// Round-trip a trivial query for readiness checks.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn db_err(e: tokio_postgres::Error) -> WalletError {
    WalletError::Storage(StorageError::Backend {
        reason: e.to_string(),
    })
}

/// Name of the violated unique constraint, if `e` is a unique violation.
fn unique_violation(e: &tokio_postgres::Error) -> Option<&str> {
    let db_error = e.as_db_error()?;
    if db_error.code() == &SqlState::UNIQUE_VIOLATION {
        Some(db_error.constraint().unwrap_or_default())
    } else {
        None
    }
}

/// Map a bigint overflow on a user's totals to `BalanceOverflow`.
fn balance_err(user_id: UserId) -> impl Fn(tokio_postgres::Error) -> WalletError {
    move |e| {
        if e.code() == Some(&SqlState::NUMERIC_VALUE_OUT_OF_RANGE) {
            WalletError::Ledger(LedgerError::BalanceOverflow { id: user_id })
        } else {
            db_err(e)
        }
    }
}

fn is_foreign_key_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION)
}

fn parse_column<T>(row: &Row, column: &str) -> WalletResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(db_err)?;
    raw.parse().map_err(|e: T::Err| {
        WalletError::Storage(StorageError::Backend {
            reason: format!("invalid {} value {:?}: {}", column, raw, e),
        })
    })
}

fn identifier_from_row(row: &Row) -> WalletResult<PaymentIdentifier> {
    Ok(PaymentIdentifier {
        id: row.try_get("id").map_err(db_err)?,
        handle: row.try_get("handle").map_err(db_err)?,
        position: row.try_get("position").map_err(db_err)?,
        active: row.try_get("active").map_err(db_err)?,
        successful_payments: row.try_get("successful_payments").map_err(db_err)?,
        max_payments_per_cycle: row.try_get("max_payments_per_cycle").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn user_from_row(row: &Row) -> WalletResult<User> {
    Ok(User {
        id: row.try_get("id").map_err(db_err)?,
        phone: row.try_get("phone").map_err(db_err)?,
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        balance: row.try_get("balance").map_err(db_err)?,
        total_recharge: row.try_get("total_recharge").map_err(db_err)?,
        total_withdraw: row.try_get("total_withdraw").map_err(db_err)?,
        total_welfare: row.try_get("total_welfare").map_err(db_err)?,
        referral_code: row.try_get("referral_code").map_err(db_err)?,
        referred_by: row.try_get("referred_by").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn transaction_from_row(row: &Row) -> WalletResult<WalletTransaction> {
    Ok(WalletTransaction {
        id: row.try_get("id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        kind: parse_column::<TransactionKind>(row, "kind")?,
        amount: row.try_get("amount").map_err(db_err)?,
        status: parse_column::<TransactionStatus>(row, "status")?,
        reference_number: row.try_get("reference_number").map_err(db_err)?,
        upi_id: row.try_get("upi_id").map_err(db_err)?,
        identifier_id: row.try_get("identifier_id").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn investment_from_row(row: &Row) -> WalletResult<Investment> {
    Ok(Investment {
        id: row.try_get("id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        plan_name: row.try_get("plan_name").map_err(db_err)?,
        amount: row.try_get("amount").map_err(db_err)?,
        daily_profit: row.try_get("daily_profit").map_err(db_err)?,
        total_profit: row.try_get("total_profit").map_err(db_err)?,
        days: row.try_get("days").map_err(db_err)?,
        days_paid: row.try_get("days_paid").map_err(db_err)?,
        status: parse_column::<InvestmentStatus>(row, "status")?,
        last_growth_on: row.try_get("last_growth_on").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn collect<T>(rows: Vec<Row>, map: fn(&Row) -> WalletResult<T>) -> WalletResult<Vec<T>> {
    rows.iter().map(map).collect()
}

// ============================================================================
// IDENTIFIER POOL
// ============================================================================

#[async_trait]
impl IdentifierStore for DbClient {
    async fn identifier_add(
        &self,
        handle: &str,
        max_payments_per_cycle: i32,
    ) -> WalletResult<PaymentIdentifier> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        // Serializes concurrent adds so max(position) + 1 stays unique.
        tx.batch_execute("LOCK TABLE payment_identifiers IN SHARE ROW EXCLUSIVE MODE")
            .await
            .map_err(db_err)?;

        let sql = format!(
            "INSERT INTO payment_identifiers (id, handle, position, max_payments_per_cycle) \
             SELECT $1, $2, COALESCE(MAX(position), 0) + 1, $3 FROM payment_identifiers \
             RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        let row = tx
            .query_one(&sql, &[&new_entity_id(), &handle, &max_payments_per_cycle])
            .await
            .map_err(|e| match unique_violation(&e) {
                Some("payment_identifiers_handle_unique") => {
                    WalletError::Pool(PoolError::DuplicateHandle {
                        handle: handle.to_string(),
                    })
                }
                _ => db_err(e),
            })?;
        tx.commit().await.map_err(db_err)?;
        identifier_from_row(&row)
    }

    async fn identifier_list(&self) -> WalletResult<Vec<PaymentIdentifier>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM payment_identifiers ORDER BY position",
            IDENTIFIER_COLUMNS
        );
        let rows = conn.query(&sql, &[]).await.map_err(db_err)?;
        collect(rows, identifier_from_row)
    }

    async fn identifier_get(&self, id: IdentifierId) -> WalletResult<Option<PaymentIdentifier>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM payment_identifiers WHERE id = $1",
            IDENTIFIER_COLUMNS
        );
        let row = conn.query_opt(&sql, &[&id]).await.map_err(db_err)?;
        row.as_ref().map(identifier_from_row).transpose()
    }

    async fn identifier_update_handle(
        &self,
        id: IdentifierId,
        handle: &str,
    ) -> WalletResult<PaymentIdentifier> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "UPDATE payment_identifiers SET handle = $2, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&id, &handle])
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => WalletError::Pool(PoolError::DuplicateHandle {
                    handle: handle.to_string(),
                }),
                None => db_err(e),
            })?
            .ok_or(WalletError::Pool(PoolError::NotFound { id }))?;
        identifier_from_row(&row)
    }

    async fn identifier_remove(&self, id: IdentifierId) -> WalletResult<PaymentIdentifier> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "DELETE FROM payment_identifiers WHERE id = $1 RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&id])
            .await
            .map_err(db_err)?
            .ok_or(WalletError::Pool(PoolError::NotFound { id }))?;
        identifier_from_row(&row)
    }

    async fn identifier_get_active(&self) -> WalletResult<Option<PaymentIdentifier>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM payment_identifiers WHERE active",
            IDENTIFIER_COLUMNS
        );
        let row = conn.query_opt(&sql, &[]).await.map_err(db_err)?;
        row.as_ref().map(identifier_from_row).transpose()
    }

    async fn identifier_activate_if_none(
        &self,
        id: IdentifierId,
    ) -> WalletResult<Option<PaymentIdentifier>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "UPDATE payment_identifiers \
             SET active = TRUE, successful_payments = 0, updated_at = now() \
             WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM payment_identifiers WHERE active) \
             RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        match conn.query_opt(&sql, &[&id]).await {
            Ok(Some(row)) => identifier_from_row(&row).map(Some),
            Ok(None) => {
                let exists = conn
                    .query_opt("SELECT 1 FROM payment_identifiers WHERE id = $1", &[&id])
                    .await
                    .map_err(db_err)?;
                match exists {
                    Some(_) => Ok(None),
                    None => Err(WalletError::Pool(PoolError::NotFound { id })),
                }
            }
            // A concurrent activation committed first.
            Err(e) if unique_violation(&e).is_some() => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn identifier_swap_active(
        &self,
        expected: IdentifierId,
        successor: IdentifierId,
        condition: SwapCondition,
    ) -> WalletResult<PaymentIdentifier> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        // Lock both rows in id order so opposing swaps cannot deadlock. The
        // condition is evaluated on the locked rows, so a concurrent swap or
        // increment is either fully visible or waits for this one.
        let sql = format!(
            "SELECT {} FROM payment_identifiers WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            IDENTIFIER_COLUMNS
        );
        let locked = collect(
            tx.query(&sql, &[&vec![expected, successor]])
                .await
                .map_err(db_err)?,
            identifier_from_row,
        )?;

        if !locked
            .iter()
            .any(|identifier| identifier.id == expected && condition.holds(identifier))
        {
            return Err(WalletError::Pool(PoolError::RotationConflict { expected }));
        }
        if !locked.iter().any(|identifier| identifier.id == successor) {
            return Err(WalletError::Pool(PoolError::NotFound { id: successor }));
        }

        if expected != successor {
            tx.execute(
                "UPDATE payment_identifiers SET active = FALSE, updated_at = now() WHERE id = $1",
                &[&expected],
            )
            .await
            .map_err(db_err)?;
        }
        let sql = format!(
            "UPDATE payment_identifiers \
             SET active = TRUE, successful_payments = 0, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        let row = tx.query_one(&sql, &[&successor]).await.map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        identifier_from_row(&row)
    }

    async fn identifier_increment_payments(
        &self,
        id: IdentifierId,
    ) -> WalletResult<PaymentIdentifier> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "UPDATE payment_identifiers \
             SET successful_payments = successful_payments + 1, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            IDENTIFIER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&id])
            .await
            .map_err(db_err)?
            .ok_or(WalletError::Pool(PoolError::NotFound { id }))?;
        identifier_from_row(&row)
    }

    async fn identifier_stats(&self) -> WalletResult<PoolStats> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) AS total, COALESCE(SUM(successful_payments), 0)::BIGINT AS payments \
                 FROM payment_identifiers",
                &[],
            )
            .await
            .map_err(db_err)?;
        drop(conn);
        Ok(PoolStats {
            active: self.identifier_get_active().await?,
            total_identifiers: row.try_get("total").map_err(db_err)?,
            total_payments_across_pool: row.try_get("payments").map_err(db_err)?,
        })
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Lock a transaction row and check it may move to `next`.
async fn decidable(
    tx: &deadpool_postgres::Transaction<'_>,
    id: TransactionId,
    next: TransactionStatus,
) -> WalletResult<WalletTransaction> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE id = $1 FOR UPDATE",
        TRANSACTION_COLUMNS
    );
    let row = tx
        .query_opt(&sql, &[&id])
        .await
        .map_err(db_err)?
        .ok_or(WalletError::Ledger(LedgerError::TransactionNotFound { id }))?;
    let current = transaction_from_row(&row)?;
    if !current.status.can_transition_to(next) {
        return Err(WalletError::Ledger(LedgerError::InvalidTransition {
            id,
            from: current.status,
            to: next,
        }));
    }
    Ok(current)
}

async fn set_status(
    tx: &deadpool_postgres::Transaction<'_>,
    id: TransactionId,
    status: TransactionStatus,
) -> WalletResult<WalletTransaction> {
    let sql = format!(
        "UPDATE transactions SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
        TRANSACTION_COLUMNS
    );
    let row = tx
        .query_one(&sql, &[&id, &status.as_str()])
        .await
        .map_err(db_err)?;
    transaction_from_row(&row)
}

/// Debit `amount` from a user inside `tx`, failing without effect when the
/// balance is short.
async fn debit(
    tx: &deadpool_postgres::Transaction<'_>,
    user_id: UserId,
    amount: Amount,
    bump_total_withdraw: bool,
) -> WalletResult<()> {
    let row = tx
        .query_opt(
            "SELECT balance FROM users WHERE id = $1 FOR UPDATE",
            &[&user_id],
        )
        .await
        .map_err(db_err)?
        .ok_or(WalletError::Ledger(LedgerError::UserNotFound { id: user_id }))?;
    let balance: Amount = row.try_get("balance").map_err(db_err)?;
    if balance < amount {
        return Err(WalletError::Ledger(LedgerError::InsufficientBalance {
            available: balance,
            requested: amount,
        }));
    }

    let withdraw_delta = if bump_total_withdraw { amount } else { 0 };
    tx.execute(
        "UPDATE users SET balance = balance - $2, total_withdraw = total_withdraw + $3 \
         WHERE id = $1",
        &[&user_id, &amount, &withdraw_delta],
    )
    .await
    .map_err(balance_err(user_id))?;
    Ok(())
}

#[async_trait]
impl LedgerStore for DbClient {
    // === User Operations ===

    async fn user_create(&self, new_user: NewUser) -> WalletResult<User> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO users (id, phone, password_hash, referral_code, referred_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &new_entity_id(),
                    &new_user.phone,
                    &new_user.password_hash,
                    &new_user.referral_code,
                    &new_user.referred_by,
                ],
            )
            .await
            .map_err(|e| match unique_violation(&e) {
                Some("users_phone_unique") => WalletError::Ledger(LedgerError::DuplicatePhone),
                Some(_) => WalletError::Storage(StorageError::TransactionFailed {
                    reason: "referral code collision, retry registration".to_string(),
                }),
                None => db_err(e),
            })?;
        user_from_row(&row)
    }

    async fn user_get(&self, id: UserId) -> WalletResult<Option<User>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = conn.query_opt(&sql, &[&id]).await.map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_get_by_phone(&self, phone: &str) -> WalletResult<Option<User>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM users WHERE phone = $1", USER_COLUMNS);
        let row = conn.query_opt(&sql, &[&phone]).await.map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_list(&self) -> WalletResult<Vec<User>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        );
        let rows = conn.query(&sql, &[]).await.map_err(db_err)?;
        collect(rows, user_from_row)
    }

    // === Transaction Operations ===

    async fn transaction_create_recharge(
        &self,
        recharge: NewRecharge,
    ) -> WalletResult<WalletTransaction> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO transactions (id, user_id, kind, amount, status, identifier_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TRANSACTION_COLUMNS
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &new_entity_id(),
                    &recharge.user_id,
                    &TransactionKind::Recharge.as_str(),
                    &recharge.amount,
                    &TransactionStatus::Pending.as_str(),
                    &recharge.identifier_id,
                ],
            )
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    WalletError::Ledger(LedgerError::UserNotFound {
                        id: recharge.user_id,
                    })
                } else {
                    db_err(e)
                }
            })?;
        transaction_from_row(&row)
    }

    async fn transaction_create_withdrawal(
        &self,
        user_id: UserId,
        amount: Amount,
        upi_id: &str,
    ) -> WalletResult<WalletTransaction> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        debit(&tx, user_id, amount, true).await?;

        let sql = format!(
            "INSERT INTO transactions (id, user_id, kind, amount, status, upi_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TRANSACTION_COLUMNS
        );
        let row = tx
            .query_one(
                &sql,
                &[
                    &new_entity_id(),
                    &user_id,
                    &TransactionKind::Withdraw.as_str(),
                    &amount,
                    &TransactionStatus::Pending.as_str(),
                    &upi_id,
                ],
            )
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        transaction_from_row(&row)
    }

    async fn transaction_get(&self, id: TransactionId) -> WalletResult<Option<WalletTransaction>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM transactions WHERE id = $1", TRANSACTION_COLUMNS);
        let row = conn.query_opt(&sql, &[&id]).await.map_err(db_err)?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn transaction_confirm_recharge(
        &self,
        id: TransactionId,
        user_id: UserId,
        reference_number: &str,
    ) -> WalletResult<WalletTransaction> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        let sql = format!(
            "SELECT {} FROM transactions WHERE id = $1 AND user_id = $2 AND kind = $3 FOR UPDATE",
            TRANSACTION_COLUMNS
        );
        let row = tx
            .query_opt(&sql, &[&id, &user_id, &TransactionKind::Recharge.as_str()])
            .await
            .map_err(db_err)?
            .ok_or(WalletError::Ledger(LedgerError::TransactionNotFound { id }))?;
        let current = transaction_from_row(&row)?;
        if current.status != TransactionStatus::Pending {
            return Err(WalletError::Ledger(LedgerError::InvalidTransition {
                id,
                from: current.status,
                to: TransactionStatus::VerificationPending,
            }));
        }

        let sql = format!(
            "UPDATE transactions SET status = $2, reference_number = $3, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            TRANSACTION_COLUMNS
        );
        let row = tx
            .query_one(
                &sql,
                &[
                    &id,
                    &TransactionStatus::VerificationPending.as_str(),
                    &reference_number,
                ],
            )
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        transaction_from_row(&row)
    }

    async fn transaction_settle(&self, id: TransactionId) -> WalletResult<Settlement> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        let current = decidable(&tx, id, TransactionStatus::Completed).await?;

        let credited = match current.kind {
            TransactionKind::Recharge => {
                let updated = tx
                    .execute(
                        "UPDATE users SET balance = balance + $2, \
                         total_recharge = total_recharge + $2 WHERE id = $1",
                        &[&current.user_id, &current.amount],
                    )
                    .await
                    .map_err(balance_err(current.user_id))?;
                if updated == 0 {
                    return Err(WalletError::Ledger(LedgerError::UserNotFound {
                        id: current.user_id,
                    }));
                }
                current.amount
            }
            TransactionKind::Withdraw => 0,
        };
        let transaction = set_status(&tx, id, TransactionStatus::Completed).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(Settlement {
            transaction,
            credited,
        })
    }

    async fn transaction_reject(&self, id: TransactionId) -> WalletResult<WalletTransaction> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        let current = decidable(&tx, id, TransactionStatus::Rejected).await?;

        if current.kind == TransactionKind::Withdraw {
            tx.execute(
                "UPDATE users SET balance = balance + $2, \
                 total_withdraw = total_withdraw - $2 WHERE id = $1",
                &[&current.user_id, &current.amount],
            )
            .await
            .map_err(balance_err(current.user_id))?;
        }
        let transaction = set_status(&tx, id, TransactionStatus::Rejected).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(transaction)
    }

    async fn transaction_list_for_user(
        &self,
        user_id: UserId,
        kind: Option<TransactionKind>,
        limit: i64,
    ) -> WalletResult<Vec<WalletTransaction>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM transactions \
             WHERE user_id = $1 AND ($2::text IS NULL OR kind = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3",
            TRANSACTION_COLUMNS
        );
        let kind = kind.map(|kind| kind.as_str());
        let rows = conn
            .query(&sql, &[&user_id, &kind, &limit])
            .await
            .map_err(db_err)?;
        collect(rows, transaction_from_row)
    }

    async fn transaction_list_all(&self, limit: i64) -> WalletResult<Vec<WalletTransaction>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC, id DESC LIMIT $1",
            TRANSACTION_COLUMNS
        );
        let rows = conn.query(&sql, &[&limit]).await.map_err(db_err)?;
        collect(rows, transaction_from_row)
    }

    async fn transaction_list_pending(
        &self,
        kind: Option<TransactionKind>,
    ) -> WalletResult<Vec<WalletTransaction>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM transactions \
             WHERE status IN ('pending', 'verification_pending') \
             AND ($1::text IS NULL OR kind = $1) \
             ORDER BY created_at DESC, id DESC",
            TRANSACTION_COLUMNS
        );
        let kind = kind.map(|kind| kind.as_str());
        let rows = conn.query(&sql, &[&kind]).await.map_err(db_err)?;
        collect(rows, transaction_from_row)
    }

    // === Check-in Operations ===

    async fn checkin_record(
        &self,
        user_id: UserId,
        day: Day,
        amount: Amount,
    ) -> WalletResult<Checkin> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        let row = tx
            .query_one(
                "INSERT INTO checkins (id, user_id, amount, checkin_date) VALUES ($1, $2, $3, $4) \
                 RETURNING id, user_id, amount, checkin_date, created_at",
                &[&new_entity_id(), &user_id, &amount, &day],
            )
            .await
            .map_err(|e| {
                if unique_violation(&e).is_some() {
                    WalletError::Ledger(LedgerError::AlreadyCheckedIn)
                } else if is_foreign_key_violation(&e) {
                    WalletError::Ledger(LedgerError::UserNotFound { id: user_id })
                } else {
                    db_err(e)
                }
            })?;
        tx.execute(
            "UPDATE users SET balance = balance + $2, total_welfare = total_welfare + $2 \
             WHERE id = $1",
            &[&user_id, &amount],
        )
        .await
        .map_err(balance_err(user_id))?;
        tx.commit().await.map_err(db_err)?;

        Ok(Checkin {
            id: row.try_get("id").map_err(db_err)?,
            user_id: row.try_get("user_id").map_err(db_err)?,
            amount: row.try_get("amount").map_err(db_err)?,
            checkin_date: row.try_get("checkin_date").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }

    // === Investment Operations ===

    async fn investment_open(
        &self,
        user_id: UserId,
        plan: &InvestmentPlan,
    ) -> WalletResult<Investment> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        debit(&tx, user_id, plan.price, false).await?;

        let sql = format!(
            "INSERT INTO investments (id, user_id, plan_name, amount, daily_profit, days, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            INVESTMENT_COLUMNS
        );
        let row = tx
            .query_one(
                &sql,
                &[
                    &new_entity_id(),
                    &user_id,
                    &plan.name,
                    &plan.price,
                    &plan.daily_profit,
                    &plan.days,
                    &InvestmentStatus::Active.as_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        investment_from_row(&row)
    }

    async fn investment_list_for_user(&self, user_id: UserId) -> WalletResult<Vec<Investment>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM investments WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            INVESTMENT_COLUMNS
        );
        let rows = conn.query(&sql, &[&user_id]).await.map_err(db_err)?;
        collect(rows, investment_from_row)
    }

    async fn investment_apply_growth(&self, day: Day) -> WalletResult<GrowthReport> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;

        // The day guard in WHERE makes a second run for the same day a no-op.
        let rows = tx
            .query(
                "UPDATE investments SET \
                     days_paid = days_paid + 1, \
                     total_profit = total_profit + daily_profit, \
                     last_growth_on = $1, \
                     status = CASE WHEN days_paid + 1 >= days THEN 'completed' ELSE status END \
                 WHERE status = 'active' AND days_paid < days \
                   AND (last_growth_on IS NULL OR last_growth_on < $1) \
                 RETURNING user_id, daily_profit, status",
                &[&day],
            )
            .await
            .map_err(db_err)?;

        let mut report = GrowthReport::default();
        for row in &rows {
            let user_id: UserId = row.try_get("user_id").map_err(db_err)?;
            let profit: Amount = row.try_get("daily_profit").map_err(db_err)?;
            let status = parse_column::<InvestmentStatus>(row, "status")?;

            tx.execute(
                "UPDATE users SET balance = balance + $2 WHERE id = $1",
                &[&user_id, &profit],
            )
            .await
            .map_err(db_err)?;

            report.processed += 1;
            report.credited += profit;
            if status == InvestmentStatus::Completed {
                report.completed += 1;
            }
        }
        tx.commit().await.map_err(db_err)?;
        Ok(report)
    }

    // === Stats ===

    async fn ledger_stats(&self) -> WalletResult<LedgerStats> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) AS total_users, \
                     COALESCE(SUM(balance), 0)::BIGINT AS total_balance, \
                     COALESCE(SUM(total_recharge), 0)::BIGINT AS total_recharge, \
                     COALESCE(SUM(total_withdraw), 0)::BIGINT AS total_withdraw \
                 FROM users",
                &[],
            )
            .await
            .map_err(db_err)?;
        Ok(LedgerStats {
            total_users: row.try_get("total_users").map_err(db_err)?,
            total_balance: row.try_get("total_balance").map_err(db_err)?,
            total_recharge: row.try_get("total_recharge").map_err(db_err)?,
            total_withdraw: row.try_get("total_withdraw").map_err(db_err)?,
        })
    }

    async fn investment_stats(&self) -> WalletResult<InvestmentStats> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FILTER (WHERE status = 'active') AS active_investments, \
                     COALESCE(SUM(amount), 0)::BIGINT AS total_invested, \
                     COALESCE(SUM(total_profit), 0)::BIGINT AS total_profit_paid \
                 FROM investments",
                &[],
            )
            .await
            .map_err(db_err)?;
        Ok(InvestmentStats {
            active_investments: row.try_get("active_investments").map_err(db_err)?,
            total_invested: row.try_get("total_invested").map_err(db_err)?,
            total_profit_paid: row.try_get("total_profit_paid").map_err(db_err)?,
        })
    }
}
