use crate::order::OrderStatus;
use sled::transaction::UnabortableTransactionError;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Incorrect number of arguments for {action}. Expecting {expected}, got {got}")]
    ArgumentCount {
        action: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Failed to parse {what} from '{value}': {reason}")]
    ArgumentParse {
        what: &'static str,
        value: String,
        reason: String,
    },
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),
    /// The invocation committed but could not be flushed to disk. Its writes
    /// are visible, so retrying a purchase fails with `DuplicateOrderId`.
    #[error("Committed, but flushing to disk failed: {0}")]
    Flush(sled::Error),
    // handed back to sled so the transaction is retried, never surfaced to callers
    #[error("Transaction interrupted: {0:?}")]
    Transaction(UnabortableTransactionError),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Invalid amount {0}. Expecting a positive integer")]
    InvalidAmount(i64),
    #[error("Invalid total price {0}. Expecting a finite, non-negative value")]
    InvalidPrice(f64),
    #[error(
        "Producer '{producer}' has insufficient inventory: {available} available, {requested} requested"
    )]
    InsufficientInventory {
        producer: String,
        available: u64,
        requested: i64,
    },
    #[error("Order id '{0}' already exists")]
    DuplicateOrderId(String),
    #[error("Order '{order_id}' cannot move from {current} to {requested}")]
    InvalidStateTransition {
        order_id: String,
        current: OrderStatus,
        requested: OrderStatus,
    },
    #[error("No {kind} found with key '{key}'")]
    NotFound { kind: &'static str, key: String },
    #[error("Row '{key}' already exists in table {table}")]
    RowExists { table: String, key: String },
    #[error("No such table: {0}")]
    UnknownTable(String),
    #[error("Order '{order_id}' is indexed under producer '{producer}' but missing from its record")]
    Diverged { order_id: String, producer: String },
}

impl From<UnabortableTransactionError> for LedgerError {
    fn from(value: UnabortableTransactionError) -> Self {
        LedgerError::Transaction(value)
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for LedgerError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        LedgerError::Encoding(value.to_string())
    }
}

impl From<minicbor::decode::Error> for LedgerError {
    fn from(value: minicbor::decode::Error) -> Self {
        LedgerError::Encoding(value.to_string())
    }
}

impl LedgerError {
    /// Whether the invocation's writes were applied despite the error.
    pub fn is_committed(&self) -> bool {
        matches!(self, LedgerError::Flush(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
