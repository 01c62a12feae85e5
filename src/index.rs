//! Order-id keyed projection of orders, independent of the seller's record
use super::error::{LedgerError, LedgerResult};
use super::order::{Order, Price, TimeStamp};
use super::store::{Field, ORDER_TABLE, Store};
use chrono::Utc;

/// One row of the order table. Rows are written once at placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: String,
    pub buyer_name: String,
    pub seller_name: String,
    pub quantity: u32,
    pub total_price: Price,
}

impl OrderRow {
    pub fn to_fields(&self) -> Vec<Field> {
        vec![
            Field::Text(self.id.clone()),
            Field::Text(self.buyer_name.clone()),
            Field::Text(self.seller_name.clone()),
            Field::Uint32(self.quantity),
            Field::Bytes(self.total_price.to_be_bytes().to_vec()),
        ]
    }

    pub fn from_fields(fields: &[Field]) -> LedgerResult<Self> {
        match fields {
            [
                Field::Text(id),
                Field::Text(buyer_name),
                Field::Text(seller_name),
                Field::Uint32(quantity),
                Field::Bytes(price),
            ] => {
                let price: [u8; 8] = price.as_slice().try_into().map_err(|_| {
                    LedgerError::Encoding(format!(
                        "order row {id}: price must be 8 bytes, found {}",
                        price.len()
                    ))
                })?;

                Ok(Self {
                    id: id.clone(),
                    buyer_name: buyer_name.clone(),
                    seller_name: seller_name.clone(),
                    quantity: *quantity,
                    total_price: Price::from_be_bytes(price)?,
                })
            }
            _ => Err(LedgerError::Encoding(format!(
                "malformed order row: {fields:?}"
            ))),
        }
    }
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            buyer_name: order.buyer_name.clone(),
            seller_name: order.seller_name.clone(),
            quantity: order.quantity,
            total_price: order.total_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderIndex {
    table: &'static str,
}

impl Default for OrderIndex {
    fn default() -> Self {
        Self { table: ORDER_TABLE }
    }
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_unique<S: Store>(&self, store: &S, row: &OrderRow) -> LedgerResult<()> {
        store
            .insert_unique_row(self.table, &row.id, &row.to_fields())
            .map_err(|err| match err {
                LedgerError::RowExists { key, .. } => LedgerError::DuplicateOrderId(key),
                other => other,
            })
    }

    pub fn lookup<S: Store>(&self, store: &S, id: &str) -> LedgerResult<Option<OrderRow>> {
        store
            .get_row_by_key(self.table, id)?
            .map(|fields| OrderRow::from_fields(&fields))
            .transpose()
    }

    /// Claims `id` in the index and returns the new order in `Placed`.
    /// A taken id fails with `DuplicateOrderId` and the existing row stays.
    #[allow(clippy::too_many_arguments)]
    pub fn place<S: Store>(
        &self,
        store: &S,
        id: String,
        buyer_name: String,
        seller_name: String,
        quantity: u32,
        total_price: Price,
        timestamp: Option<TimeStamp<Utc>>,
    ) -> LedgerResult<Order> {
        let order = Order::place(id, buyer_name, seller_name, quantity, total_price, timestamp);
        self.insert_unique(store, &OrderRow::from(&order))?;

        Ok(order)
    }
}
