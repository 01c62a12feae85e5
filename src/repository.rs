use super::error::LedgerResult;
use super::producer::Producer;
use super::store::Store;

/// Loads and stores producer records keyed by producer name.
#[derive(Debug, Clone)]
pub struct ProducerRepository {
    initial_inventory: u64,
}

impl ProducerRepository {
    pub fn new(initial_inventory: u64) -> Self {
        Self { initial_inventory }
    }

    /// Returns `None` for an unknown name. Queries go through here so that
    /// reading never creates a producer.
    pub fn load<S: Store>(&self, store: &S, name: &str) -> LedgerResult<Option<Producer>> {
        match store.get(name)? {
            Some(bytes) => {
                let producer = Producer::from_cbor(&bytes)?;
                tracing::debug!(
                    producer = name,
                    inventory = producer.current_inventory,
                    orders = producer.orders.len(),
                    "loaded producer"
                );
                Ok(Some(producer))
            }
            None => Ok(None),
        }
    }

    pub fn get_or_create<S: Store>(&self, store: &S, name: &str) -> LedgerResult<Producer> {
        if let Some(producer) = self.load(store, name)? {
            return Ok(producer);
        }

        tracing::debug!(
            producer = name,
            inventory = self.initial_inventory,
            "creating new producer"
        );
        Ok(Producer::new(name.to_string(), self.initial_inventory))
    }

    /// Encodes before writing: on an encoding failure nothing is written and
    /// the stored record stays authoritative. Returns the record digest.
    pub fn save<S: Store>(&self, store: &S, producer: &Producer) -> LedgerResult<String> {
        let (digest, contents) = producer.finalise()?;
        store.put(&producer.name, &contents)?;

        tracing::debug!(producer = %producer.name, %digest, "saved producer");
        Ok(digest)
    }

    pub fn delete<S: Store>(&self, store: &S, key: &str) -> LedgerResult<()> {
        store.delete(key)?;
        tracing::debug!(key, "deleted key");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::order::{Order, Price, TimeStamp};
    use crate::store::Field;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    // Minimal in-memory store. `broken` makes every read fail.
    #[derive(Default)]
    struct MemoryStore {
        state: RefCell<BTreeMap<String, Vec<u8>>>,
        broken: bool,
    }

    impl Store for MemoryStore {
        fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
            if self.broken {
                return Err(LedgerError::Storage(sled::Error::Unsupported(
                    "store offline".into(),
                )));
            }
            Ok(self.state.borrow().get(key).cloned())
        }
        fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
            self.state.borrow_mut().insert(key.into(), value.to_vec());
            Ok(())
        }
        fn delete(&self, key: &str) -> LedgerResult<()> {
            self.state.borrow_mut().remove(key);
            Ok(())
        }
        fn insert_unique_row(&self, table: &str, _: &str, _: &[Field]) -> LedgerResult<()> {
            Err(LedgerError::UnknownTable(table.into()))
        }
        fn get_row_by_key(&self, table: &str, _: &str) -> LedgerResult<Option<Vec<Field>>> {
            Err(LedgerError::UnknownTable(table.into()))
        }
    }

    #[test]
    fn creates_unknown_producers_with_initial_inventory() {
        let store = MemoryStore::default();
        let repo = ProducerRepository::new(100);

        let producer = repo.get_or_create(&store, "farmA").unwrap();

        assert_eq!(producer, Producer::new("farmA".into(), 100));
        // creation alone does not persist
        assert!(repo.load(&store, "farmA").unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::default();
        let repo = ProducerRepository::new(0);
        let producer = Producer::new("farmA".into(), 42);

        repo.save(&store, &producer).unwrap();

        assert_eq!(repo.load(&store, "farmA").unwrap(), Some(producer));
    }

    #[test]
    fn read_failures_propagate_as_storage_errors() {
        let store = MemoryStore {
            broken: true,
            ..Default::default()
        };
        let repo = ProducerRepository::new(0);

        assert!(matches!(
            repo.get_or_create(&store, "farmA"),
            Err(LedgerError::Storage(_))
        ));
    }

    #[test]
    fn corrupt_records_are_encoding_errors() {
        let store = MemoryStore::default();
        store.put("farmA", b"not cbor at all").unwrap();
        let repo = ProducerRepository::new(0);

        assert!(matches!(
            repo.get_or_create(&store, "farmA"),
            Err(LedgerError::Encoding(_))
        ));
    }

    #[test]
    fn unencodable_records_are_not_written() {
        let store = MemoryStore::default();
        let repo = ProducerRepository::new(0);
        let original = Producer::new("farmA".into(), 5);
        repo.save(&store, &original).unwrap();

        let mut broken = original.clone();
        broken.orders.push(Order::place(
            "o1".into(),
            "buyer1".into(),
            "farmA".into(),
            1,
            Price::new(1.0).unwrap(),
            Some("3000-01-01T00:00:00Z".parse::<TimeStamp<chrono::Utc>>().unwrap()),
        ));

        assert!(matches!(
            repo.save(&store, &broken),
            Err(LedgerError::Encoding(_))
        ));
        assert_eq!(repo.load(&store, "farmA").unwrap(), Some(original));
    }
}
