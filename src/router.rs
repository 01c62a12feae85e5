//! Maps a named action and its positional arguments onto the service
use super::error::{LedgerError, LedgerResult};
use super::order::{Order, TimeStamp};
use super::producer::Producer;
use super::service::{CoffeeService, PurchaseRequest};
use super::store::Store;
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    HarvestCoffee,
    BuyCoffee,
    ShipCoffee,
    CoffeeArrivesAtBorder,
    CoffeeArrives,
    MakePayment,
    GetProducer,
    GetOrder,
    Delete,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::HarvestCoffee,
        Action::BuyCoffee,
        Action::ShipCoffee,
        Action::CoffeeArrivesAtBorder,
        Action::CoffeeArrives,
        Action::MakePayment,
        Action::GetProducer,
        Action::GetOrder,
        Action::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::HarvestCoffee => "harvestCoffee",
            Action::BuyCoffee => "buyCoffee",
            Action::ShipCoffee => "shipCoffee",
            Action::CoffeeArrivesAtBorder => "coffeeArrivesAtBorder",
            Action::CoffeeArrives => "coffeeArrives",
            Action::MakePayment => "makePayment",
            Action::GetProducer => "getProducer",
            Action::GetOrder => "getOrder",
            Action::Delete => "delete",
        }
    }

    /// Number of positional arguments the action takes
    pub fn arity(self) -> usize {
        match self {
            Action::HarvestCoffee => 2,
            Action::BuyCoffee => 3,
            Action::ShipCoffee
            | Action::CoffeeArrivesAtBorder
            | Action::CoffeeArrives
            | Action::MakePayment => 2,
            Action::GetProducer | Action::GetOrder | Action::Delete => 1,
        }
    }

    /// Queries write nothing, so the ledger skips flushing after them.
    pub fn is_query(self) -> bool {
        matches!(self, Action::GetProducer | Action::GetOrder)
    }
}

impl FromStr for Action {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| LedgerError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an action produced inside its transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Harvested { producer: Producer, amount: i64 },
    Purchased { producer: Producer, order_id: String },
    Advanced(Order),
    Producer(Producer),
    Order(Order),
    Deleted(String),
}

impl Outcome {
    /// The cbor result handed back to the caller: a producer for harvest,
    /// purchase and `getProducer`, an order for the fulfillment actions and
    /// `getOrder`, nothing for `delete`.
    pub fn to_cbor(&self) -> LedgerResult<Vec<u8>> {
        match self {
            Outcome::Harvested { producer, .. }
            | Outcome::Purchased { producer, .. }
            | Outcome::Producer(producer) => producer.finalise().map(|(_, bytes)| bytes),
            Outcome::Advanced(order) | Outcome::Order(order) => order.to_cbor(),
            Outcome::Deleted(_) => Ok(vec![]),
        }
    }

    /// Logs the business event. Only call once the transaction committed.
    pub fn log_committed(&self) {
        match self {
            Outcome::Harvested { producer, amount } => tracing::info!(
                "Producer {} just harvested {} pounds of coffee beans. Current Inventory = {}",
                producer.name,
                amount,
                producer.current_inventory
            ),
            Outcome::Purchased { producer, order_id } => {
                if let Some(order) = producer.find_order(order_id) {
                    tracing::info!(
                        "Buyer '{}' just purchased {} units from Producer '{}' for {}, leaving it with {} units in inventory of coffee beans.",
                        order.buyer_name,
                        order.quantity,
                        producer.name,
                        order.total_price,
                        producer.current_inventory
                    );
                }
            }
            Outcome::Advanced(order) => tracing::info!(
                order = %order.id,
                seller = %order.seller_name,
                status = %order.status,
                "order advanced"
            ),
            Outcome::Producer(producer) => {
                tracing::debug!(producer = %producer.name, "producer served")
            }
            Outcome::Order(order) => tracing::debug!(order = %order.id, "order served"),
            Outcome::Deleted(key) => tracing::info!(key = %key, "record deleted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionRouter {
    service: CoffeeService,
}

impl ActionRouter {
    pub fn new(service: CoffeeService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &CoffeeService {
        &self.service
    }

    /// Runs one action against `store` after checking its argument count
    pub fn dispatch<S: Store, A: AsRef<str>>(
        &self,
        store: &S,
        action: Action,
        args: &[A],
    ) -> LedgerResult<Outcome> {
        if args.len() != action.arity() {
            return Err(LedgerError::ArgumentCount {
                action: action.name(),
                expected: action.arity(),
                got: args.len(),
            });
        }
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();

        let outcome = match action {
            Action::HarvestCoffee => {
                let amount = parse_amount(args[1])?;
                let producer = self.service.harvest_coffee(store, args[0], amount)?;
                Outcome::Harvested { producer, amount }
            }
            Action::BuyCoffee => {
                tracing::debug!("buyCoffee: order JSON input: '{}'", args[2]);
                let request = parse_order(args[2])?;
                let order_id = request.id.clone();
                let producer = self.service.buy_coffee(store, args[0], args[1], request)?;
                Outcome::Purchased { producer, order_id }
            }
            Action::ShipCoffee => {
                let at = parse_timestamp(args[1])?;
                Outcome::Advanced(self.service.ship_coffee(store, args[0], at)?)
            }
            Action::CoffeeArrivesAtBorder => {
                let at = parse_timestamp(args[1])?;
                Outcome::Advanced(self.service.coffee_arrives_at_border(store, args[0], at)?)
            }
            Action::CoffeeArrives => {
                let at = parse_timestamp(args[1])?;
                Outcome::Advanced(self.service.coffee_arrives(store, args[0], at)?)
            }
            Action::MakePayment => {
                let at = parse_timestamp(args[1])?;
                Outcome::Advanced(self.service.make_payment(store, args[0], at)?)
            }
            Action::GetProducer => Outcome::Producer(self.service.get_producer(store, args[0])?),
            Action::GetOrder => Outcome::Order(self.service.get_order(store, args[0])?),
            Action::Delete => {
                self.service.delete(store, args[0])?;
                Outcome::Deleted(args[0].to_string())
            }
        };

        Ok(outcome)
    }
}

fn parse_amount(value: &str) -> LedgerResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|err: std::num::ParseIntError| LedgerError::ArgumentParse {
            what: "amount",
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn parse_timestamp(value: &str) -> LedgerResult<TimeStamp<Utc>> {
    value
        .trim()
        .parse()
        .map_err(|err: chrono::ParseError| LedgerError::ArgumentParse {
            what: "timestamp",
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn parse_order(value: &str) -> LedgerResult<PurchaseRequest> {
    serde_json::from_str(value).map_err(|err| LedgerError::ArgumentParse {
        what: "order",
        value: value.to_string(),
        reason: err.to_string(),
    })
}
