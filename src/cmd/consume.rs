use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    broker::Broker,
    client::ProxiedRequest,
    error::Result,
    forward::Routed,
    queue::Delivery,
};

/// Checks out the message at the head of `queue`
#[derive(Debug)]
pub struct Consume {
    queue: String,
    request: ProxiedRequest,
}

impl Consume {
    pub fn new(queue: String, request: ProxiedRequest) -> Self {
        Self { queue, request }
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<Routed<ConsumeResponse>> {
        Ok(broker
            .queue()
            .consume(&self.queue, self.request)
            .await?
            .map(ConsumeResponse::from))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsumeResponse {
    pub status: String,
    pub node: String,
    pub message: Value,
    /// pass this back to [`super::ack::Ack`] once the message has been processed
    pub ack_token: String,
}

impl From<Delivery> for ConsumeResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            status: "message consumed".to_string(),
            node: delivery.node,
            message: delivery.message,
            ack_token: delivery.ack_token,
        }
    }
}
