//! Wallet Storage - Storage Traits
//!
//! Async store interfaces for the payment identifier pool and the ledger,
//! plus in-memory backends. The PostgreSQL backend lives with the API
//! server, which owns the connection pool.

pub mod identifier_store;
pub mod ledger_store;
pub mod memory;

pub use identifier_store::{IdentifierStore, SwapCondition};
pub use ledger_store::LedgerStore;
pub use memory::{InMemoryIdentifierStore, InMemoryLedger};
