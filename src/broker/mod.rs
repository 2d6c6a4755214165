//! The [`Broker`] ties cluster membership, the delivery queue and the cache together behind a single
//! handle. One instance is built at startup and shared by every request handler.
use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{event, instrument, Level};

use crate::{
    broadcast::{FanoutReport, InvalidationBroadcaster},
    cache::CacheFront,
    client::Client,
    cluster::state::{Node, State as ClusterState},
    error::Result,
    forward::Forwarder,
    queue::DeliveryQueue,
    server::SyncStorageEngine,
};

#[derive(Debug)]
pub struct Broker {
    cluster_state: Arc<ClusterState>,
    queue: DeliveryQueue,
    cache: CacheFront,
    broadcaster: InvalidationBroadcaster,
}

#[derive(Debug, Clone, Copy)]
pub struct BrokerOptions {
    pub cache_capacity: usize,
    pub broadcast_timeout: Duration,
}

impl Broker {
    /// `queues` holds the queues this node owns. `records` is the record store the cache reads
    /// through to, usually shared by every node of the cluster.
    pub fn new(
        cluster_state: Arc<ClusterState>,
        client: Arc<dyn Client>,
        queues: SyncStorageEngine,
        records: SyncStorageEngine,
        options: BrokerOptions,
    ) -> Self {
        let forwarder = Forwarder::new(cluster_state.own_id(), client.clone());
        let queue = DeliveryQueue::new(cluster_state.clone(), forwarder, queues);
        let cache = CacheFront::new(options.cache_capacity, records);
        let broadcaster =
            InvalidationBroadcaster::new(client, cluster_state.peers(), options.broadcast_timeout);

        Self {
            cluster_state,
            queue,
            cache,
            broadcaster,
        }
    }

    pub fn own_node(&self) -> &Node {
        self.cluster_state.own_node()
    }

    pub fn peers(&self) -> &[Node] {
        self.broadcaster.peers()
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn cache(&self) -> &CacheFront {
        &self.cache
    }

    /// Stores `value` under `key` and asks every peer to drop its cached copy.
    ///
    /// The write is complete once the record store has it. The returned handle resolves when
    /// the invalidation fan-out finishes but callers are free to drop it.
    #[instrument(name = "broker::write_cache", level = "info", skip(self, value))]
    pub async fn write_cache(&self, key: &str, value: &Value) -> Result<JoinHandle<FanoutReport>> {
        self.cache.write(key, value).await?;
        event!(
            Level::DEBUG,
            "{} written, invalidating {} peers",
            key,
            self.broadcaster.peers().len()
        );

        Ok(self.broadcaster.fanout(key))
    }
}
