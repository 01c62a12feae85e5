//! Producer records as persisted under the producer's name
use super::error::LedgerResult;
use super::order::Order;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
#[cbor(map)]
pub struct Producer {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub current_inventory: u64,
    #[n(2)]
    pub orders: Vec<Order>, // purchase order
}

impl Producer {
    pub fn new(name: String, initial_inventory: u64) -> Self {
        Self {
            name,
            current_inventory: initial_inventory,
            orders: vec![],
        }
    }

    pub fn find_order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == order_id)
    }

    /// Serialises the record into cbor and returns the sha256 digest of those
    /// bytes alongside them. Replicas applying the same invocations must agree
    /// on the digest.
    pub fn finalise(&self) -> LedgerResult<(String, Vec<u8>)> {
        let contents = minicbor::to_vec(self)?;
        let hash = sha256::digest(&contents);

        Ok((hash, contents))
    }

    pub fn from_cbor(bytes: &[u8]) -> LedgerResult<Self> {
        Ok(minicbor::decode(bytes)?)
    }
}
