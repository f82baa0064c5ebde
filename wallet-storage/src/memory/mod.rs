//! In-memory backends used by tests and local runs without PostgreSQL.

mod identifiers;
mod ledger;

pub use identifiers::InMemoryIdentifierStore;
pub use ledger::InMemoryLedger;
