//! sled-backed ledger: one transaction per invocation
use super::config::LedgerConfig;
use super::error::{LedgerError, LedgerResult};
use super::router::{Action, ActionRouter};
use super::service::CoffeeService;
use super::store::{self, Field, ORDER_TABLE, Store};
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use std::sync::Arc;

const STATE_TREE: &str = "state";

pub struct Ledger {
    instance: Arc<sled::Db>,
    state: sled::Tree,
    orders: sled::Tree,
    router: ActionRouter,
    config: LedgerConfig,
}

/// One invocation's view of both trees. Writes stay private to the
/// transaction until it commits.
pub struct SledSession<'t> {
    state: &'t TransactionalTree,
    orders: &'t TransactionalTree,
}

impl Ledger {
    pub fn open(config: LedgerConfig) -> LedgerResult<Self> {
        let db = sled::open(&config.path)?;
        Self::new(Arc::new(db), config)
    }

    pub fn new(instance: Arc<sled::Db>, config: LedgerConfig) -> LedgerResult<Self> {
        let state = instance.open_tree(STATE_TREE)?;
        let orders = instance.open_tree(ORDER_TABLE)?;
        let router = ActionRouter::new(CoffeeService::new(config.initial_inventory));

        tracing::debug!(
            path = %config.path.display(),
            initial_inventory = config.initial_inventory,
            "ledger opened"
        );

        Ok(Self {
            instance,
            state,
            orders,
            router,
            config,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn router(&self) -> &ActionRouter {
        &self.router
    }

    /// Runs `f` as a single transaction over the producer records and the
    /// order table. Any error aborts and discards every write made by `f`.
    /// sled re-runs `f` from a clean read when a concurrent invocation
    /// invalidated what it read.
    pub fn transact<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: Fn(&SledSession<'_>) -> LedgerResult<T>,
    {
        let result = (&self.state, &self.orders).transaction(|(state, orders)| {
            let session = SledSession { state, orders };
            f(&session).map_err(|err| match err {
                LedgerError::Transaction(inner) => inner.into(),
                other => ConflictableTransactionError::Abort(other),
            })
        });

        match result {
            Ok(value) => Ok(value),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(LedgerError::Storage(err)),
        }
    }

    /// Dispatches one action in its own transaction. A failed flush after
    /// the commit comes back as `LedgerError::Flush`, with the writes applied.
    pub fn invoke<A: AsRef<str>>(&self, action: &str, args: &[A]) -> LedgerResult<Vec<u8>> {
        let output = action
            .parse::<Action>()
            .and_then(|parsed| self.commit(parsed, args));

        if let Err(err) = &output {
            tracing::warn!(action, error = %err, "invocation rejected");
        }

        output
    }

    fn commit<A: AsRef<str>>(&self, action: Action, args: &[A]) -> LedgerResult<Vec<u8>> {
        let (outcome, bytes) = self.transact(|session| {
            let outcome = self.router.dispatch(session, action, args)?;
            let bytes = outcome.to_cbor()?;
            Ok((outcome, bytes))
        })?;
        outcome.log_committed();

        if self.config.flush_on_commit && !action.is_query() {
            self.instance.flush().map_err(LedgerError::Flush)?;
        }

        Ok(bytes)
    }
}

impl SledSession<'_> {
    fn table(&self, table: &str) -> LedgerResult<&TransactionalTree> {
        match table {
            ORDER_TABLE => Ok(self.orders),
            other => Err(LedgerError::UnknownTable(other.to_string())),
        }
    }
}

impl Store for SledSession<'_> {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.state.get(key.as_bytes())?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.state.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.state.remove(key.as_bytes())?;
        Ok(())
    }

    fn insert_unique_row(&self, table: &str, key: &str, fields: &[Field]) -> LedgerResult<()> {
        let tree = self.table(table)?;
        if tree.get(key.as_bytes())?.is_some() {
            return Err(LedgerError::RowExists {
                table: table.to_string(),
                key: key.to_string(),
            });
        }

        tree.insert(key.as_bytes(), store::encode_row(fields)?)?;
        Ok(())
    }

    fn get_row_by_key(&self, table: &str, key: &str) -> LedgerResult<Option<Vec<Field>>> {
        let tree = self.table(table)?;
        tree.get(key.as_bytes())?
            .map(|bytes| store::decode_row(&bytes))
            .transpose()
    }
}
