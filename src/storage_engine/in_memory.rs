//! An in-memory [`StorageEngine`] implementation
//!
//! This implementation keeps records and lists in [`HashMap`]s wrapped by a single [`Mutex`].
//! Holding one lock for the whole store is what makes `move_front_to_back` and `remove_all` atomic.
//! Used for development/testing and as the default engine of a node.
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::instrument;

use super::{Error, Result, StorageEngine};

#[derive(Debug, Default)]
struct Store {
    records: HashMap<Bytes, Bytes>,
    lists: HashMap<Bytes, VecDeque<Bytes>>,
}

/// The InMemory [`StorageEngine`] definition
#[derive(Clone, Debug, Default)]
pub struct InMemory {
    inner: Arc<Mutex<Store>>,
}

impl InMemory {
    /// private function used to acquire a lock over the [`Store`].
    /// A fail to acquire a lock is considered a [`Error::Logic`] since the only reason why
    /// an [`Error`] should be returned is in case of [`Mutex`] poisoning
    fn acquire_lock(&self) -> Result<MutexGuard<Store>> {
        match self.inner.lock() {
            Ok(guard) => Ok(guard),
            Err(_) => Err(Error::Logic {
                reason: "Unable to acquire lock for InMemory storage engine - poisoned..."
                    .to_string(),
            }),
        }
    }
}

#[async_trait]
impl StorageEngine for InMemory {
    #[instrument(name = "storage_engine::in_memory::get", level = "debug", skip(self))]
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let guard = self.acquire_lock()?;
        Ok(guard.records.get(key).cloned())
    }

    #[instrument(name = "storage_engine::in_memory::put", level = "debug", skip(self))]
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
        let mut guard = self.acquire_lock()?;
        guard.records.insert(key, value);
        Ok(())
    }

    #[instrument(
        name = "storage_engine::in_memory::push_back",
        level = "debug",
        skip(self)
    )]
    async fn push_back(&self, list: &[u8], value: Bytes) -> Result<usize> {
        let mut guard = self.acquire_lock()?;
        let entries = guard
            .lists
            .entry(Bytes::copy_from_slice(list))
            .or_default();
        entries.push_back(value);
        Ok(entries.len())
    }

    #[instrument(
        name = "storage_engine::in_memory::move_front_to_back",
        level = "debug",
        skip(self)
    )]
    async fn move_front_to_back(&self, src: &[u8], dst: &[u8]) -> Result<Option<Bytes>> {
        let mut guard = self.acquire_lock()?;
        let value = match guard.lists.get_mut(src).and_then(|entries| entries.pop_front()) {
            Some(value) => value,
            None => return Ok(None),
        };

        if guard.lists.get(src).is_some_and(|entries| entries.is_empty()) {
            guard.lists.remove(src);
        }

        guard
            .lists
            .entry(Bytes::copy_from_slice(dst))
            .or_default()
            .push_back(value.clone());

        Ok(Some(value))
    }

    #[instrument(
        name = "storage_engine::in_memory::remove_all",
        level = "debug",
        skip(self)
    )]
    async fn remove_all(&self, list: &[u8], value: &[u8]) -> Result<usize> {
        let mut guard = self.acquire_lock()?;
        let Some(entries) = guard.lists.get_mut(list) else {
            return Ok(0);
        };

        let before = entries.len();
        entries.retain(|entry| entry.as_ref() != value);
        let removed = before - entries.len();

        if entries.is_empty() {
            guard.lists.remove(list);
        }

        Ok(removed)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_len(&self, list: &[u8]) -> Result<usize> {
        let guard = self.acquire_lock()?;
        Ok(guard.lists.get(list).map_or(0, VecDeque::len))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemory;
    use crate::{storage_engine::StorageEngine, utils::generate_random_ascii_string};
    use bytes::Bytes;
    use quickcheck::Arbitrary;

    #[tokio::test]
    async fn put_get() {
        let store = InMemory::default();
        let key = Bytes::from("key");
        let value = Bytes::from("value");

        assert!(store.get(&key).await.unwrap().is_none());
        store.put(key.clone(), value.clone()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap(), value);
    }

    #[tokio::test]
    async fn override_key() {
        let store = InMemory::default();
        let key = Bytes::from("key");
        let value1 = Bytes::from("value");
        let value2 = Bytes::from("value2");

        store.put(key.clone(), value1.clone()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap(), value1);

        store.put(key.clone(), value2.clone()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap(), value2);
    }

    #[tokio::test]
    async fn lists_are_fifo() {
        let store = InMemory::default();
        for i in 0..3 {
            let len = store
                .push_back(b"orders", Bytes::from(format!("m{}", i)))
                .await
                .unwrap();
            assert_eq!(len, i + 1);
        }

        for i in 0..3 {
            let moved = store
                .move_front_to_back(b"orders", b"orders:processing")
                .await
                .unwrap();
            assert_eq!(moved.unwrap(), Bytes::from(format!("m{}", i)));
        }

        assert!(store
            .move_front_to_back(b"orders", b"orders:processing")
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.list_len(b"orders").await.unwrap(), 0);
        assert_eq!(store.list_len(b"orders:processing").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn remove_all_matches_by_value() {
        let store = InMemory::default();
        store.push_back(b"l", Bytes::from("a")).await.unwrap();
        store.push_back(b"l", Bytes::from("b")).await.unwrap();
        store.push_back(b"l", Bytes::from("a")).await.unwrap();

        assert_eq!(store.remove_all(b"l", b"a").await.unwrap(), 2);
        assert_eq!(store.list_len(b"l").await.unwrap(), 1);
        assert_eq!(store.remove_all(b"l", b"a").await.unwrap(), 0);
        assert_eq!(store.remove_all(b"missing", b"a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn records_and_lists_do_not_collide() {
        let store = InMemory::default();
        store
            .put(Bytes::from("name"), Bytes::from("record"))
            .await
            .unwrap();
        store.push_back(b"name", Bytes::from("entry")).await.unwrap();

        assert_eq!(
            store.get(b"name").await.unwrap().unwrap(),
            Bytes::from("record")
        );
        assert_eq!(store.list_len(b"name").await.unwrap(), 1);
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestInput {
        values_thread_1: Vec<String>,
        values_thread_2: Vec<String>,
        values_thread_3: Vec<String>,
    }

    fn generate_random_deduped_values(n_values: usize) -> Vec<String> {
        let mut values = Vec::with_capacity(n_values);
        for _ in 0..n_values {
            values.push(generate_random_ascii_string(20))
        }
        values.sort();
        values.dedup();
        values
    }

    impl Arbitrary for TestInput {
        fn arbitrary(_: &mut quickcheck::Gen) -> Self {
            let values = generate_random_deduped_values(600);
            let third = values.len() / 3;

            Self {
                values_thread_1: Vec::from(&values[0..third]),
                values_thread_2: Vec::from(&values[third..2 * third]),
                values_thread_3: Vec::from(&values[2 * third..]),
            }
        }
    }

    async fn produce_consume(store: InMemory, items: Vec<String>) -> anyhow::Result<usize> {
        for item in items.iter() {
            store.push_back(b"shared", Bytes::from(item.clone())).await?;
        }

        let mut consumed = 0;
        while store
            .move_front_to_back(b"shared", b"shared:processing")
            .await?
            .is_some()
        {
            consumed += 1;
        }

        Ok(consumed)
    }

    // Asserts that concurrent producers/consumers sharing one list
    //  1. don't hang due to bad mutex usage
    //  2. never lose or duplicate a message while moving it between lists
    #[quickcheck_async::tokio]
    async fn concurrency_test_move_front_to_back(input: TestInput) {
        let store = InMemory::default();
        let h1 = tokio::spawn(produce_consume(store.clone(), input.values_thread_1.clone()));
        let h2 = tokio::spawn(produce_consume(store.clone(), input.values_thread_2.clone()));
        let h3 = tokio::spawn(produce_consume(store.clone(), input.values_thread_3.clone()));

        let (r1, r2, r3) = tokio::join!(h1, h2, h3);
        let total = r1.unwrap().unwrap() + r2.unwrap().unwrap() + r3.unwrap().unwrap();

        let produced = input.values_thread_1.len()
            + input.values_thread_2.len()
            + input.values_thread_3.len();
        assert_eq!(total, produced);
        assert_eq!(store.list_len(b"shared").await.unwrap(), 0);
        assert_eq!(
            store.list_len(b"shared:processing").await.unwrap(),
            produced
        );
    }
}
