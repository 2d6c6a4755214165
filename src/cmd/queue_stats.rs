use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    broker::Broker,
    client::ProxiedRequest,
    error::Result,
    forward::Routed,
    queue::Pending,
};

/// Reports how many messages of `queue` are waiting and how many are checked out
#[derive(Debug)]
pub struct QueueStats {
    queue: String,
    request: ProxiedRequest,
}

impl QueueStats {
    pub fn new(queue: String, request: ProxiedRequest) -> Self {
        Self { queue, request }
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<Routed<QueueStatsResponse>> {
        Ok(broker
            .queue()
            .pending(&self.queue, self.request)
            .await?
            .map(QueueStatsResponse::from))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueStatsResponse {
    pub queue: String,
    pub node: String,
    pub ready: usize,
    pub in_flight: usize,
}

impl From<Pending> for QueueStatsResponse {
    fn from(pending: Pending) -> Self {
        Self {
            queue: pending.queue,
            node: pending.node,
            ready: pending.ready,
            in_flight: pending.in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::QueueStats;
    use crate::{
        client::{mock::MockClientBuilder, ProxiedRequest},
        cmd::test_support,
        forward::Routed,
    };

    #[tokio::test]
    async fn counts_ready_and_in_flight() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));
        for id in 0..3 {
            broker
                .queue()
                .produce_local("orders", json!({ "id": id }))
                .await
                .unwrap();
        }
        broker.queue().consume_local("orders").await.unwrap();

        match QueueStats::new("orders".to_string(), ProxiedRequest::default())
            .execute(broker)
            .await
            .unwrap()
        {
            Routed::Local(stats) => {
                assert_eq!(stats.queue, "orders");
                assert_eq!(stats.ready, 2);
                assert_eq!(stats.in_flight, 1);
            }
            Routed::Forwarded(_) => panic!("orders is owned by A"),
        }
    }
}
