use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{broker::Broker, error::Result};

/// Local cache counters
#[derive(Debug)]
pub struct Metrics;

impl Metrics {
    pub fn execute(self, broker: Arc<Broker>) -> Result<MetricsResponse> {
        let stats = broker.cache().stats()?;
        Ok(MetricsResponse {
            node: broker.own_node().id.clone(),
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            cache_size: stats.size,
            cache_capacity: stats.capacity,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub node: String,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: usize,
    pub cache_capacity: usize,
}
