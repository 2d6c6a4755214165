//! Local read-through cache.
//!
//! Cache entries are not sharded: every node keeps its own copy of whatever it has read recently.
//! Reads that miss the cache go to the record store. Writes go to the record store and drop the local
//! entry. Peers are told to drop theirs by the [`crate::broadcast::InvalidationBroadcaster`].
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use serde_json::Value;
use tracing::{event, instrument, Level};

use crate::{
    error::{Error, Internal, Result},
    server::SyncStorageEngine,
};

pub mod lru;
pub mod metrics;

use self::{
    lru::Lru,
    metrics::{Metrics, MetricsSnapshot},
};

/// Where a value returned by [`CacheFront::read_through`] came from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Source {
    Cache,
    Store,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead {
    pub value: Value,
    pub source: Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug)]
struct Entries {
    lru: Lru<Value>,
    /// Bumped by every write and invalidation. A miss only fills the cache if the generation
    /// it saw before reading the record store is still current afterwards.
    generation: u64,
}

#[derive(Debug)]
pub struct CacheFront {
    entries: Mutex<Entries>,
    metrics: Metrics,
    records: SyncStorageEngine,
}

impl CacheFront {
    pub fn new(capacity: usize, records: SyncStorageEngine) -> Self {
        Self {
            entries: Mutex::new(Entries {
                lru: Lru::new(capacity),
                generation: 0,
            }),
            metrics: Metrics::default(),
            records,
        }
    }

    fn acquire_lock(&self) -> Result<MutexGuard<Entries>> {
        self.entries.lock().map_err(|_| {
            Error::Internal(Internal::Logic {
                reason: "Unable to acquire lock for the local cache - poisoned...".to_string(),
            })
        })
    }

    /// Serves `key` from the local cache or, on a miss, from the record store.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the key is neither cached nor stored
    #[instrument(name = "cache::read_through", level = "info", skip(self))]
    pub async fn read_through(&self, key: &str) -> Result<CacheRead> {
        let (cached, generation) = {
            let mut entries = self.acquire_lock()?;
            (entries.lru.get(key), entries.generation)
        };
        if let Some(value) = cached {
            self.metrics.hit();
            return Ok(CacheRead {
                value,
                source: Source::Cache,
            });
        }

        self.metrics.miss();
        event!(Level::DEBUG, "cache miss for {}, reading from store", key);
        let raw = self
            .records
            .get(key.as_bytes())
            .await?
            .ok_or_else(|| Error::NotFound {
                key: key.to_string(),
            })?;
        let value: Value = serde_json::from_slice(&raw).map_err(|e| {
            Error::Internal(Internal::CorruptedEntry {
                reason: e.to_string(),
            })
        })?;

        let mut entries = self.acquire_lock()?;
        if entries.generation == generation {
            entries.lru.put(key.to_string(), value.clone());
        } else {
            event!(Level::DEBUG, "cache changed while reading {}, not caching it", key);
        }

        Ok(CacheRead {
            value,
            source: Source::Store,
        })
    }

    /// Stores `value` in the record store and drops the stale local entry.
    /// The next read repopulates the cache from the store.
    #[instrument(name = "cache::write", level = "info", skip(self, value))]
    pub async fn write(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = serde_json::to_vec(value).map_err(|e| {
            Error::Internal(Internal::Logic {
                reason: format!("Unable to encode value: {}", e),
            })
        })?;
        self.records
            .put(Bytes::copy_from_slice(key.as_bytes()), Bytes::from(encoded))
            .await?;
        self.invalidate_local(key)?;

        Ok(())
    }

    /// Drops `key` from the local cache. Returns whether an entry was actually dropped.
    /// Misses still reading the record store won't cache what they read.
    pub fn invalidate_local(&self, key: &str) -> Result<bool> {
        let mut entries = self.acquire_lock()?;
        entries.generation = entries.generation.wrapping_add(1);
        Ok(entries.lru.remove(key).is_some())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let guard = self.acquire_lock()?;
        let MetricsSnapshot { hits, misses } = self.metrics.snapshot();
        Ok(CacheStats {
            hits,
            misses,
            size: guard.lru.len(),
            capacity: guard.lru.capacity(),
        })
    }
}
