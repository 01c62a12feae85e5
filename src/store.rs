//! Store primitives every ledger operation runs against.
//!
//! An implementation represents one invocation's view of the store: reads see
//! the writes made earlier in the same invocation, and nothing becomes
//! visible to other invocations until the whole unit commits.
use super::error::LedgerResult;

/// Name of the row table holding the order index.
pub const ORDER_TABLE: &str = "Orders";

/// A typed column value in a row table.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum Field {
    #[n(0)]
    Text(#[n(0)] String),
    #[n(1)]
    Uint32(#[n(0)] u32),
    #[n(2)]
    Bytes(#[b(0)] Vec<u8>),
}

pub trait Store {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()>;
    fn delete(&self, key: &str) -> LedgerResult<()>;

    /// Fails with `RowExists` when `key` is already present in `table`.
    fn insert_unique_row(&self, table: &str, key: &str, fields: &[Field]) -> LedgerResult<()>;
    fn get_row_by_key(&self, table: &str, key: &str) -> LedgerResult<Option<Vec<Field>>>;
}

pub fn encode_row(fields: &[Field]) -> LedgerResult<Vec<u8>> {
    Ok(minicbor::to_vec(fields)?)
}

pub fn decode_row(bytes: &[u8]) -> LedgerResult<Vec<Field>> {
    Ok(minicbor::decode(bytes)?)
}
