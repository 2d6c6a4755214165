//! Cache invalidation fan-out.
//!
//! After a cache write, every peer is asked to drop its copy of the key. This is fire-and-forget:
//! the caller gets a [`JoinHandle`] back immediately and nobody is required to await it. Each peer
//! gets a single attempt bounded by a timeout, and failures are only logged.
use std::{sync::Arc, time::Duration};

use futures::{stream::FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::{event, Instrument, Level};

use crate::{client::Client, cluster::state::Node};

/// Outcome of a single fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct InvalidationBroadcaster {
    client: Arc<dyn Client>,
    peers: Vec<Node>,
    timeout: Duration,
}

impl std::fmt::Debug for InvalidationBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBroadcaster")
            .field("peers", &self.peers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl InvalidationBroadcaster {
    pub fn new(client: Arc<dyn Client>, peers: Vec<Node>, timeout: Duration) -> Self {
        Self {
            client,
            peers,
            timeout,
        }
    }

    pub fn peers(&self) -> &[Node] {
        &self.peers
    }

    /// Spawns the invalidation of `key` on every peer and returns right away.
    pub fn fanout(&self, key: &str) -> JoinHandle<FanoutReport> {
        let client = self.client.clone();
        let peers = self.peers.clone();
        let timeout = self.timeout;
        let key = key.to_string();

        let span = tracing::info_span!("broadcast::fanout", key = %key);
        tokio::spawn(
            async move { invalidate_all(client, peers, timeout, key).await }.instrument(span),
        )
    }
}

async fn invalidate_all(
    client: Arc<dyn Client>,
    peers: Vec<Node>,
    timeout: Duration,
    key: String,
) -> FanoutReport {
    let mut futures = FuturesUnordered::new();
    for peer in peers.iter() {
        let client = client.clone();
        let key = key.as_str();
        futures.push(async move {
            let result = tokio::time::timeout(timeout, client.invalidate(&peer.addr, key)).await;
            (peer, result)
        });
    }

    let mut report = FanoutReport::default();
    while let Some((peer, result)) = futures.next().await {
        match result {
            Ok(Ok(())) => report.delivered += 1,
            Ok(Err(err)) => {
                event!(
                    Level::WARN,
                    "unable to invalidate {} on {} ({}): {}",
                    key,
                    peer.id,
                    peer.addr,
                    err
                );
                report.failed += 1;
            }
            Err(_) => {
                event!(
                    Level::WARN,
                    "invalidation of {} on {} ({}) timed out after {:?}",
                    key,
                    peer.id,
                    peer.addr,
                    timeout
                );
                report.failed += 1;
            }
        }
    }

    event!(
        Level::DEBUG,
        "invalidation of {} reached {} of {} peers",
        key,
        report.delivered,
        peers.len()
    );
    report
}
