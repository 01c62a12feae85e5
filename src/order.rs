//! Order records and the fulfillment lifecycle state machine
use super::error::{LedgerError, LedgerResult};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Fulfillment stages, in the only order an order may move through them.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum OrderStatus {
    #[n(0)]
    Placed,
    #[n(1)]
    Shipped,
    #[n(2)]
    ArrivedAtBorder,
    #[n(3)]
    Arrived,
    #[n(4)]
    Paid,
}

impl OrderStatus {
    pub const SEQUENCE: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Shipped,
        OrderStatus::ArrivedAtBorder,
        OrderStatus::Arrived,
        OrderStatus::Paid,
    ];

    /// The unique legal next stage, `None` once paid.
    pub fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::ArrivedAtBorder),
            OrderStatus::ArrivedAtBorder => Some(OrderStatus::Arrived),
            OrderStatus::Arrived => Some(OrderStatus::Paid),
            OrderStatus::Paid => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::ArrivedAtBorder => "ArrivedAtBorder",
            OrderStatus::Arrived => "Arrived",
            OrderStatus::Paid => "Paid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    /// Panics on an impossible calendar date.
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

/// Parses an RFC 3339 timestamp, normalised to UTC.
impl FromStr for TimeStamp<Utc> {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s)?;
        Ok(TimeStamp(parsed.with_timezone(&Utc)))
    }
}

impl fmt::Display for TimeStamp<Utc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Opaque total price of an order. Only storage and display are supported.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> LedgerResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(LedgerError::InvalidPrice(value));
        }
        Ok(Price(value))
    }
    pub fn value(&self) -> f64 {
        self.0
    }
    /// Fixed-width encoding used by the order index.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
    pub fn from_be_bytes(bytes: [u8; 8]) -> LedgerResult<Self> {
        Price::new(f64::from_be_bytes(bytes))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl<C> minicbor::Encode<C> for Price {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.f64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Price {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let value = d.f64()?;

        Price::new(value).map_err(|_| {
            minicbor::decode::Error::message("stored price is negative or not finite")
        })
    }
}

// Embedded in the seller's record and projected into the order index.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
#[cbor(map)]
pub struct Order {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub buyer_name: String,
    #[n(2)]
    pub seller_name: String,
    #[n(3)]
    pub quantity: u32,
    #[n(4)]
    pub total_price: Price,
    #[n(5)]
    pub status: OrderStatus,
    #[n(6)]
    pub order_timestamp: Option<TimeStamp<Utc>>,
    #[n(7)]
    pub shipped_timestamp: Option<TimeStamp<Utc>>,
    #[n(8)]
    pub arrived_at_border_timestamp: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub arrived_timestamp: Option<TimeStamp<Utc>>,
    #[n(10)]
    pub paid_timestamp: Option<TimeStamp<Utc>>,
}

impl Order {
    /// A fresh order in the `Placed` stage. Uniqueness of `id` is the order
    /// index's concern, see [`crate::index::OrderIndex::place`].
    pub fn place(
        id: String,
        buyer_name: String,
        seller_name: String,
        quantity: u32,
        total_price: Price,
        timestamp: Option<TimeStamp<Utc>>,
    ) -> Self {
        Self {
            id,
            buyer_name,
            seller_name,
            quantity,
            total_price,
            status: OrderStatus::Placed,
            order_timestamp: timestamp,
            shipped_timestamp: None,
            arrived_at_border_timestamp: None,
            arrived_timestamp: None,
            paid_timestamp: None,
        }
    }

    /// Moves the order to `target` if it is the immediate successor of the
    /// current stage. `self` is left untouched either way.
    pub fn advance(&self, target: OrderStatus, at: TimeStamp<Utc>) -> LedgerResult<Order> {
        if self.status.successor() != Some(target) {
            return Err(LedgerError::InvalidStateTransition {
                order_id: self.id.clone(),
                current: self.status,
                requested: target,
            });
        }

        let mut next = self.clone();
        next.status = target;
        *next.timestamp_slot(target) = Some(at);
        Ok(next)
    }

    pub fn timestamp_for(&self, status: OrderStatus) -> Option<&TimeStamp<Utc>> {
        match status {
            OrderStatus::Placed => self.order_timestamp.as_ref(),
            OrderStatus::Shipped => self.shipped_timestamp.as_ref(),
            OrderStatus::ArrivedAtBorder => self.arrived_at_border_timestamp.as_ref(),
            OrderStatus::Arrived => self.arrived_timestamp.as_ref(),
            OrderStatus::Paid => self.paid_timestamp.as_ref(),
        }
    }

    fn timestamp_slot(&mut self, status: OrderStatus) -> &mut Option<TimeStamp<Utc>> {
        match status {
            OrderStatus::Placed => &mut self.order_timestamp,
            OrderStatus::Shipped => &mut self.shipped_timestamp,
            OrderStatus::ArrivedAtBorder => &mut self.arrived_at_border_timestamp,
            OrderStatus::Arrived => &mut self.arrived_timestamp,
            OrderStatus::Paid => &mut self.paid_timestamp,
        }
    }

    pub fn to_cbor(&self) -> LedgerResult<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> LedgerResult<Self> {
        Ok(minicbor::decode(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed() -> Order {
        Order::place(
            "o1".into(),
            "buyer1".into(),
            "farmA".into(),
            20,
            Price::new(100.0).unwrap(),
            Some(TimeStamp::new_with(2024, 3, 1, 9, 0, 0)),
        )
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn timestamp_beyond_nanosecond_range_fails_to_encode() {
        let far: TimeStamp<Utc> = "3000-01-01T00:00:00Z".parse().unwrap();

        assert!(minicbor::to_vec(far).is_err());
    }

    #[test]
    fn timestamp_parses_offsets_into_utc() {
        let ts: TimeStamp<Utc> = "2024-03-01T11:00:00+02:00".parse().unwrap();

        assert_eq!(ts, TimeStamp::new_with(2024, 3, 1, 9, 0, 0));
    }

    #[test]
    fn walks_the_full_lifecycle() {
        let mut order = placed();

        for (i, target) in OrderStatus::SEQUENCE.iter().skip(1).enumerate() {
            let at = TimeStamp::new_with(2024, 3, 2 + i as u32, 0, 0, 0);
            order = order.advance(*target, at.clone()).unwrap();

            assert_eq!(order.status, *target);
            assert_eq!(order.timestamp_for(*target), Some(&at));
        }

        assert!(order.status.is_terminal());
    }

    #[test]
    fn rejects_skipping_a_stage() {
        let order = placed();
        let at = TimeStamp::new_with(2024, 3, 2, 0, 0, 0);

        let err = order.advance(OrderStatus::Arrived, at).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InvalidStateTransition {
                current: OrderStatus::Placed,
                requested: OrderStatus::Arrived,
                ..
            }
        ));
        assert_eq!(order.status, OrderStatus::Placed);
        assert!(order.arrived_timestamp.is_none());
    }

    #[test]
    fn rejects_repeating_and_moving_backward() {
        let at = TimeStamp::new_with(2024, 3, 2, 0, 0, 0);
        let shipped = placed().advance(OrderStatus::Shipped, at.clone()).unwrap();

        assert!(shipped.advance(OrderStatus::Shipped, at.clone()).is_err());
        assert!(shipped.advance(OrderStatus::Placed, at).is_err());
    }

    #[test]
    fn paid_is_terminal() {
        let at = TimeStamp::new_with(2024, 3, 2, 0, 0, 0);
        let mut order = placed();
        for target in &OrderStatus::SEQUENCE[1..] {
            order = order.advance(*target, at.clone()).unwrap();
        }

        for target in OrderStatus::SEQUENCE {
            assert!(order.advance(target, at.clone()).is_err());
        }
    }

    #[test]
    fn price_rejects_negative_and_nan() {
        assert!(matches!(Price::new(-1.0), Err(LedgerError::InvalidPrice(_))));
        assert!(Price::new(f64::NAN).is_err());
        assert!(Price::new(0.0).is_ok());
    }

    #[test]
    fn price_bytes_are_exact() {
        let price = Price::new(0.1 + 0.2).unwrap();

        let restored = Price::from_be_bytes(price.to_be_bytes()).unwrap();

        assert_eq!(price.value().to_bits(), restored.value().to_bits());
    }
}
