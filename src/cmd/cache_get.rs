use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{broker::Broker, error::Result};

/// Reads `key` through the local cache
#[derive(Debug)]
pub struct CacheGet {
    key: String,
}

impl CacheGet {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<CacheGetResponse> {
        let read = broker.cache().read_through(&self.key).await?;

        Ok(CacheGetResponse {
            key: self.key,
            data: read.value,
            source: read.source.to_string(),
            node: broker.own_node().id.clone(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheGetResponse {
    pub key: String,
    pub data: Value,
    /// `cache` or `store`
    pub source: String,
    pub node: String,
}
