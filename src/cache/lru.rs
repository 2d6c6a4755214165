//! A small least-recently-used map.
//!
//! Recency is tracked with a monotonically increasing tick per access. `order` maps tick -> key, so
//! the first entry of `order` is always the least recently used key.
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct Lru<V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, (V, u64)>,
    order: BTreeMap<u64, String>,
}

impl<V: Clone> Lru<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Returns a copy of the value and marks `key` as most recently used
    pub fn get(&mut self, key: &str) -> Option<V> {
        let tick = self.next_tick();
        let (value, last_used) = self.entries.get_mut(key)?;
        self.order.remove(&*last_used);
        *last_used = tick;
        self.order.insert(tick, key.to_string());
        Some(value.clone())
    }

    /// Inserts or replaces `key`, evicting the least recently used entry if full
    pub fn put(&mut self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }

        let tick = self.next_tick();
        if let Some((_, last_used)) = self.entries.remove(&key) {
            self.order.remove(&last_used);
        } else if self.entries.len() >= self.capacity {
            if let Some((_, evicted)) = self.order.pop_first() {
                self.entries.remove(&evicted);
            }
        }

        self.order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let (value, last_used) = self.entries.remove(key)?;
        self.order.remove(&last_used);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
