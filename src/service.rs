//! Service layer API for harvest, purchase and fulfillment operations
use super::error::{LedgerError, LedgerResult};
use super::index::OrderIndex;
use super::inventory;
use super::order::{Order, OrderStatus, Price, TimeStamp};
use super::producer::Producer;
use super::repository::ProducerRepository;
use super::store::Store;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Order record as supplied by a buyer with `buyCoffee`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default, alias = "timestamp")]
    pub order_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CoffeeService {
    producers: ProducerRepository,
    orders: OrderIndex,
}

impl CoffeeService {
    pub fn new(initial_inventory: u64) -> Self {
        Self {
            producers: ProducerRepository::new(initial_inventory),
            orders: OrderIndex::new(),
        }
    }

    pub fn orders(&self) -> &OrderIndex {
        &self.orders
    }

    /// Adds freshly harvested coffee to a producer's inventory
    pub fn harvest_coffee<S: Store>(
        &self,
        store: &S,
        producer_name: &str,
        amount: i64,
    ) -> LedgerResult<Producer> {
        let producer = self.producers.get_or_create(store, producer_name)?;
        let producer = inventory::apply_harvest(&producer, amount)?;
        self.producers.save(store, &producer)?;

        Ok(producer)
    }

    /// Sells `request.quantity` to `buyer_name`, deducting inventory and
    /// recording the order in both the producer and the order index
    pub fn buy_coffee<S: Store>(
        &self,
        store: &S,
        producer_name: &str,
        buyer_name: &str,
        request: PurchaseRequest,
    ) -> LedgerResult<Producer> {
        let total_price = Price::new(request.total_price)?;
        let quantity =
            u32::try_from(request.quantity).map_err(|_| LedgerError::InvalidAmount(request.quantity))?;

        // Read immediately before deciding; a concurrent purchase that commits
        // first invalidates this read and the invocation is retried.
        let producer = self.producers.get_or_create(store, producer_name)?;
        let mut producer = inventory::apply_purchase(&producer, request.quantity)?;

        let order = self.orders.place(
            store,
            request.id,
            buyer_name.to_string(),
            producer_name.to_string(),
            quantity,
            total_price,
            request.order_timestamp.map(TimeStamp::from),
        )?;
        producer.orders.push(order);
        self.producers.save(store, &producer)?;

        Ok(producer)
    }

    // sled may re-run any of these after a conflict; business events are
    // logged by the ledger once the commit lands.

    /// Moves an order one stage forward, updating the seller's embedded copy.
    /// The index row holds only the immutable placement columns.
    pub fn advance_order<S: Store>(
        &self,
        store: &S,
        order_id: &str,
        target: OrderStatus,
        at: TimeStamp<Utc>,
    ) -> LedgerResult<Order> {
        let (mut producer, position) = self.locate(store, order_id)?;

        let order = producer.orders[position].advance(target, at)?;
        producer.orders[position] = order.clone();
        self.producers.save(store, &producer)?;

        Ok(order)
    }

    pub fn ship_coffee<S: Store>(
        &self,
        store: &S,
        order_id: &str,
        at: TimeStamp<Utc>,
    ) -> LedgerResult<Order> {
        self.advance_order(store, order_id, OrderStatus::Shipped, at)
    }

    pub fn coffee_arrives_at_border<S: Store>(
        &self,
        store: &S,
        order_id: &str,
        at: TimeStamp<Utc>,
    ) -> LedgerResult<Order> {
        self.advance_order(store, order_id, OrderStatus::ArrivedAtBorder, at)
    }

    pub fn coffee_arrives<S: Store>(
        &self,
        store: &S,
        order_id: &str,
        at: TimeStamp<Utc>,
    ) -> LedgerResult<Order> {
        self.advance_order(store, order_id, OrderStatus::Arrived, at)
    }

    pub fn make_payment<S: Store>(
        &self,
        store: &S,
        order_id: &str,
        at: TimeStamp<Utc>,
    ) -> LedgerResult<Order> {
        self.advance_order(store, order_id, OrderStatus::Paid, at)
    }

    pub fn get_producer<S: Store>(&self, store: &S, producer_name: &str) -> LedgerResult<Producer> {
        self.producers
            .load(store, producer_name)?
            .ok_or_else(|| LedgerError::NotFound {
                kind: "producer",
                key: producer_name.to_string(),
            })
    }

    pub fn get_order<S: Store>(&self, store: &S, order_id: &str) -> LedgerResult<Order> {
        let (producer, position) = self.locate(store, order_id)?;
        Ok(producer.orders[position].clone())
    }

    /// Administrative removal of a raw key. Not part of any business flow.
    pub fn delete<S: Store>(&self, store: &S, key: &str) -> LedgerResult<()> {
        self.producers.delete(store, key)
    }

    // Resolve an order id to its seller's record and the order's position in it
    fn locate<S: Store>(&self, store: &S, order_id: &str) -> LedgerResult<(Producer, usize)> {
        let row = self
            .orders
            .lookup(store, order_id)?
            .ok_or_else(|| LedgerError::NotFound {
                kind: "order",
                key: order_id.to_string(),
            })?;

        let diverged = || LedgerError::Diverged {
            order_id: order_id.to_string(),
            producer: row.seller_name.clone(),
        };
        let producer = self
            .producers
            .load(store, &row.seller_name)?
            .ok_or_else(diverged)?;
        let position = producer
            .orders
            .iter()
            .position(|order| order.id == order_id)
            .ok_or_else(diverged)?;

        Ok((producer, position))
    }
}
