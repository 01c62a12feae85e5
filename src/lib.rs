pub mod config;
pub mod error;
pub mod index;
pub mod inventory;
pub mod ledger;
pub mod order;
pub mod producer;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod utils;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
