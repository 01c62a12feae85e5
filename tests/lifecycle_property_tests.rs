//! Property-based tests for the order lifecycle state machine
//!
//! The lifecycle is linear: Placed, Shipped, ArrivedAtBorder, Arrived, Paid.
//! Whatever sequence of transition requests an order receives, it must only
//! ever be observed in a stage reachable by single forward steps, and a
//! rejected request must leave it exactly as it was.
//
// These property tests cover:
//
// 1. Only the immediate successor is accepted
// 2. Rejected requests never mutate the order
// 3. Random request sequences never skip a stage
// 4. Encoding is stable for any reachable order

use coffee_ledger::{
    LedgerError,
    order::{Order, OrderStatus, Price, TimeStamp},
};
use proptest::prelude::*;

/// Strategy to generate any lifecycle stage
fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    (0usize..OrderStatus::SEQUENCE.len()).prop_map(|i| OrderStatus::SEQUENCE[i])
}

/// Strategy to generate a timestamp within 2024
fn timestamp_strategy() -> impl Strategy<Value = TimeStamp<chrono::Utc>> {
    (1u32..=12, 1u32..=28, 0u32..24).prop_map(|(month, day, hour)| {
        TimeStamp::new_with(2024, month, day, hour, 0, 0)
    })
}

/// Strategy to generate a freshly placed order
fn placed_order_strategy() -> impl Strategy<Value = Order> {
    (1u32..=10_000, 0u32..=1_000_000, timestamp_strategy()).prop_map(|(quantity, cents, at)| {
        Order::place(
            "o1".into(),
            "buyer1".into(),
            "farmA".into(),
            quantity,
            Price::new(cents as f64 / 100.0).unwrap(),
            Some(at),
        )
    })
}

/// Drive an order forward to `stage` through every intermediate step
fn advance_to(mut order: Order, stage: OrderStatus, at: &TimeStamp<chrono::Utc>) -> Order {
    while order.status < stage {
        let next = order.status.successor().unwrap();
        order = order.advance(next, at.clone()).unwrap();
    }
    order
}

// PROPERTY TESTS
proptest! {
    /// Property: from any stage, exactly the successor is accepted
    #[test]
    fn prop_only_successor_is_accepted(
        order in placed_order_strategy(),
        stage in status_strategy(),
        target in status_strategy(),
        at in timestamp_strategy(),
    ) {
        let order = advance_to(order, stage, &at);
        let result = order.advance(target, at.clone());

        if order.status.successor() == Some(target) {
            let next = result.unwrap();
            prop_assert_eq!(next.status, target);
            prop_assert_eq!(next.timestamp_for(target), Some(&at));
        } else {
            let is_invalid = matches!(
                result,
                Err(LedgerError::InvalidStateTransition { current, requested, .. })
                    if current == order.status && requested == target
            );
            prop_assert!(is_invalid);
        }
    }

    /// Property: random request sequences only ever move one stage forward
    #[test]
    fn prop_random_requests_never_skip(
        order in placed_order_strategy(),
        requests in prop::collection::vec((status_strategy(), timestamp_strategy()), 0..=20),
    ) {
        let mut order = order;

        for (target, at) in requests {
            let before = order.clone();
            match order.advance(target, at) {
                Ok(next) => {
                    prop_assert_eq!(Some(next.status), before.status.successor());
                    order = next;
                }
                Err(_) => prop_assert_eq!(&order, &before),
            }
        }

        // every stage up to the current one is stamped, none beyond it
        for stage in &OrderStatus::SEQUENCE[1..] {
            prop_assert_eq!(order.timestamp_for(*stage).is_some(), *stage <= order.status);
        }
    }

    /// Property: any reachable order re-encodes to identical bytes
    #[test]
    fn prop_reachable_orders_encode_stably(
        order in placed_order_strategy(),
        stage in status_strategy(),
        at in timestamp_strategy(),
    ) {
        let order = advance_to(order, stage, &at);

        let bytes = order.to_cbor().unwrap();
        let decoded = Order::from_cbor(&bytes).unwrap();

        prop_assert_eq!(&decoded, &order);
        prop_assert_eq!(decoded.to_cbor().unwrap(), bytes);
    }
}
