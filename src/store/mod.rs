mod ledger;
pub mod migration;
pub mod models;

pub use ledger::LedgerStore;
pub use models::*;
