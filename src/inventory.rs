//! Inventory deltas for harvests and purchases.
//!
//! Both functions are pure: they return an updated copy and never touch the
//! producer they were given, so a rejected delta leaves nothing to undo.
//! Persisting the result is up to the caller.
use super::error::{LedgerError, LedgerResult};
use super::producer::Producer;

pub fn apply_harvest(producer: &Producer, amount: i64) -> LedgerResult<Producer> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }

    let current_inventory = producer
        .current_inventory
        .checked_add(amount as u64)
        .ok_or(LedgerError::InvalidAmount(amount))?;

    Ok(Producer {
        current_inventory,
        ..producer.clone()
    })
}

pub fn apply_purchase(producer: &Producer, quantity: i64) -> LedgerResult<Producer> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidAmount(quantity));
    }
    if quantity as u64 > producer.current_inventory {
        return Err(LedgerError::InsufficientInventory {
            producer: producer.name.clone(),
            available: producer.current_inventory,
            requested: quantity,
        });
    }

    Ok(Producer {
        current_inventory: producer.current_inventory - quantity as u64,
        ..producer.clone()
    })
}
