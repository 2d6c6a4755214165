use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    broker::Broker,
    client::ProxiedRequest,
    error::Result,
    forward::Routed,
    queue::Produced,
};

/// Appends the JSON document carried by `request` to `queue`
#[derive(Debug)]
pub struct Produce {
    queue: String,
    request: ProxiedRequest,
}

impl Produce {
    pub fn new(queue: String, request: ProxiedRequest) -> Self {
        Self { queue, request }
    }

    pub async fn execute(self, broker: Arc<Broker>) -> Result<Routed<ProduceResponse>> {
        Ok(broker
            .queue()
            .produce(&self.queue, self.request)
            .await?
            .map(ProduceResponse::from))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub status: String,
    pub queue: String,
    pub node: String,
    pub message: Value,
}

impl From<Produced> for ProduceResponse {
    fn from(produced: Produced) -> Self {
        Self {
            status: "message produced".to_string(),
            queue: produced.queue,
            node: produced.node,
            message: produced.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::Produce;
    use crate::{
        client::{mock::MockClientBuilder, ProxiedRequest},
        cmd::test_support,
        error::{Error, InvalidRequest},
        forward::Routed,
    };

    fn request(body: &str) -> ProxiedRequest {
        ProxiedRequest {
            method: "POST".to_string(),
            path_and_query: "/queue/orders".to_string(),
            headers: vec![],
            body: Bytes::from(body.to_string()),
        }
    }

    #[tokio::test]
    async fn invalid_json_is_rejected() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));
        let err = Produce::new("orders".to_string(), request("{not json"))
            .execute(broker)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::InvalidRequest(InvalidRequest::InvalidJsonPayload(_))
        ));
    }

    #[tokio::test]
    async fn response_fields() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));
        let response = Produce::new("orders".to_string(), request("[1,2]"))
            .execute(broker)
            .await
            .unwrap();
        match response {
            Routed::Local(response) => {
                assert_eq!(response.status, "message produced");
                assert_eq!(response.queue, "orders");
                assert_eq!(response.node, "A");
                assert_eq!(response.message, serde_json::json!([1, 2]));
            }
            Routed::Forwarded(_) => panic!("orders is owned by A"),
        }
    }
}
