use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Inventory a producer starts with the first time it is referenced. A
/// producer has to harvest before it can sell.
pub const DEFAULT_INITIAL_INVENTORY: u64 = 0;

/// Ledger configuration, loaded from environment variables or built in code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub initial_inventory: u64,
    pub flush_on_commit: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("coffee-ledger.db"),
            initial_inventory: DEFAULT_INITIAL_INVENTORY,
            flush_on_commit: true,
        }
    }
}

impl LedgerConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn initial_inventory(mut self, initial_inventory: u64) -> Self {
        self.initial_inventory = initial_inventory;
        self
    }

    pub fn flush_on_commit(mut self, flush: bool) -> Self {
        self.flush_on_commit = flush;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        let defaults = Self::default();

        Ok(Self {
            path: env::var("COFFEE_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            initial_inventory: match env::var("COFFEE_LEDGER_INITIAL_INVENTORY") {
                Ok(value) => value
                    .parse()
                    .context("COFFEE_LEDGER_INITIAL_INVENTORY must be a non-negative integer")?,
                Err(_) => defaults.initial_inventory,
            },
            flush_on_commit: match env::var("COFFEE_LEDGER_FLUSH") {
                Ok(value) => value
                    .parse()
                    .context("COFFEE_LEDGER_FLUSH must be true or false")?,
                Err(_) => defaults.flush_on_commit,
            },
        })
    }
}
