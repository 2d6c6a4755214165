use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{broker::Broker, error::Result, queue::parse_document};

const DATA_FIELD: &str = "data";

/// Writes a value to the record store and invalidates every cached copy of it
#[derive(Debug)]
pub struct CachePut {
    key: String,
    data: Value,
}

impl CachePut {
    pub fn new(key: String, data: Value) -> Self {
        Self { key, data }
    }

    /// The stored value is the `data` field of the body. Bodies without one are stored whole.
    pub fn try_from_body(key: String, body: &[u8]) -> Result<Self> {
        let data = match parse_document(body)? {
            Value::Object(mut fields) if fields.contains_key(DATA_FIELD) => fields
                .remove(DATA_FIELD)
                .unwrap_or(Value::Null),
            document => document,
        };

        Ok(Self::new(key, data))
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<CachePutResponse> {
        // the fan-out keeps running in the background, we don't wait for it
        let _ = broker.write_cache(&self.key, &self.data).await?;

        Ok(CachePutResponse {
            status: "data updated".to_string(),
            key: self.key,
            new_data: self.data,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CachePutResponse {
    pub status: String,
    pub key: String,
    pub new_data: Value,
}
