use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::{broker::Broker, error::Result};

/// Drops `key` from this node's cache. Issued by peers after they write the key.
#[derive(Debug)]
pub struct Invalidate {
    key: String,
}

impl Invalidate {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    pub fn execute(self, broker: Arc<Broker>) -> Result<InvalidateResponse> {
        let dropped = broker.cache().invalidate_local(&self.key)?;
        event!(Level::DEBUG, "invalidated {} (cached: {})", self.key, dropped);

        Ok(InvalidateResponse {
            status: "cache invalidated".to_string(),
            key: self.key,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub status: String,
    pub key: String,
}
