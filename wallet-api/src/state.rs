//! Shared application state for Axum routers.

use std::sync::Arc;

use wallet_core::WalletConfig;
use wallet_rotation::{RotationEngine, SettlementHook};
use wallet_storage::{IdentifierStore, InMemoryIdentifierStore, InMemoryLedger, LedgerStore};

use crate::auth::AuthConfig;
use crate::db::DbClient;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Payment identifier pool.
    pub identifiers: Arc<dyn IdentifierStore>,
    /// Users, transactions, check-ins and investments.
    pub ledger: Arc<dyn LedgerStore>,
    pub engine: RotationEngine,
    pub hook: SettlementHook,
    pub auth: Arc<AuthConfig>,
    pub wallet: Arc<WalletConfig>,
    /// Present when running against PostgreSQL; used by readiness checks.
    pub db: Option<DbClient>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        identifiers: Arc<dyn IdentifierStore>,
        ledger: Arc<dyn LedgerStore>,
        auth: AuthConfig,
        wallet: WalletConfig,
        db: Option<DbClient>,
    ) -> Self {
        let engine = RotationEngine::new(identifiers.clone(), wallet.rotation.clone());
        let hook = SettlementHook::new(engine.clone());
        Self {
            identifiers,
            ledger,
            engine,
            hook,
            auth: Arc::new(auth),
            wallet: Arc::new(wallet),
            db,
            start_time: std::time::Instant::now(),
        }
    }

    /// State backed by one PostgreSQL client for both stores.
    pub fn with_database(db: DbClient, auth: AuthConfig, wallet: WalletConfig) -> Self {
        Self::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            auth,
            wallet,
            Some(db),
        )
    }

    /// State backed by in-memory stores.
    pub fn in_memory(auth: AuthConfig, wallet: WalletConfig) -> Self {
        Self::new(
            Arc::new(InMemoryIdentifierStore::new()),
            Arc::new(InMemoryLedger::new()),
            auth,
            wallet,
            None,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("auth", &self.auth)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(Arc<WalletConfig>, wallet);
crate::impl_from_ref!(RotationEngine, engine);
