//! This trait represents the interface for a storage engine.
//!
//! A storage engine holds two kinds of data:
//!  1. records - plain key/value pairs (the backing store the cache reads through to)
//!  2. lists - ordered sequences of values addressed by name (the backing store for queues)
//!
//! Keys and values are opaque bytes and are not interpreted in any way by StorageEngine implementations.
//! Every method is expected to be atomic on its own. Callers never hold a lock across calls.
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::fmt::Debug;

pub mod in_memory;

#[async_trait]
pub trait StorageEngine: Debug {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()>;

    /// Appends `value` to the tail of `list`, returning the new list length
    async fn push_back(&self, list: &[u8], value: Bytes) -> Result<usize>;
    /// Pops the head of `src` and appends it to the tail of `dst` as a single atomic step.
    /// Returns `None` if `src` is empty.
    async fn move_front_to_back(&self, src: &[u8], dst: &[u8]) -> Result<Option<Bytes>>;
    /// Removes every element of `list` equal to `value`, returning how many were removed
    async fn remove_all(&self, list: &[u8], value: &[u8]) -> Result<usize>;
    async fn list_len(&self, list: &[u8]) -> Result<usize>;
}

#[derive(Debug, Serialize)]
pub enum Error {
    Internal,
    Logic { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}
