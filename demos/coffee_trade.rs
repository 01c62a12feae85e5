// Walks one order from harvest to payment against a ledger configured from
// the environment (see `LedgerConfig::from_env`).
//
//   RUST_LOG=debug COFFEE_LEDGER_PATH=/tmp/coffee cargo run --example coffee_trade

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use coffee_ledger::{Ledger, LedgerConfig, order::Order, producer::Producer, utils};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coffee_ledger=debug,sled=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LedgerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(path = %config.path.display(), "Opening ledger");
    let ledger = Ledger::open(config).context("Failed to open ledger")?;

    // the caller owns the clock; the ledger only stores what it is given
    let placed_at = Utc::now();
    let order_id = utils::new_order_id()?;

    ledger.invoke("harvestCoffee", &["farmA", "50"])?;

    let order_json = serde_json::json!({
        "id": order_id,
        "quantity": 20,
        "totalPrice": 100.0,
        "orderTimestamp": placed_at.to_rfc3339(),
    })
    .to_string();
    let bytes = ledger.invoke("buyCoffee", &["farmA", "buyer1", order_json.as_str()])?;
    let producer = Producer::from_cbor(&bytes)?;
    tracing::info!(
        inventory = producer.current_inventory,
        orders = producer.orders.len(),
        "purchase recorded"
    );

    let stages = [
        "shipCoffee",
        "coffeeArrivesAtBorder",
        "coffeeArrives",
        "makePayment",
    ];
    for (day, action) in stages.into_iter().enumerate() {
        let at = (placed_at + Duration::days(day as i64 + 1)).to_rfc3339();
        let order = Order::from_cbor(&ledger.invoke(action, &[order_id.as_str(), at.as_str()])?)?;
        tracing::info!(order = %order.id, status = %order.status, "{action} accepted");
    }

    // replaying a stage is refused
    if let Err(err) = ledger.invoke("shipCoffee", &[order_id.as_str(), placed_at.to_rfc3339().as_str()]) {
        tracing::info!("replayed shipment refused: {err}");
    }

    let producer = Producer::from_cbor(&ledger.invoke("getProducer", &["farmA"])?)?;
    let (digest, _) = producer.finalise()?;
    println!(
        "{} holds {} units across {} order(s), record digest {}",
        producer.name,
        producer.current_inventory,
        producer.orders.len(),
        digest
    );

    Ok(())
}
