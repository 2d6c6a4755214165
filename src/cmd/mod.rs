//! Module that contains all commands implemented by shardq.
//!
//! # Design principals
//! Commands have 2 responsibilities:
//!  1. Parse request params (path segments and JSON bodies)
//!  2. Construct responses that are sent back to callers
//!
//! Everything else should be delegated to the [`crate::broker::Broker`] and the modules behind it.
pub mod ack;
pub mod cache_get;
pub mod cache_put;
pub mod consume;
pub mod invalidate;
pub mod metrics;
pub mod node_info;
pub mod produce;
pub mod queue_stats;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;

use ack::Ack as AckCommand;
use cache_get::CacheGet as CacheGetCommand;
use cache_put::CachePut as CachePutCommand;
use consume::Consume as ConsumeCommand;
use invalidate::Invalidate as InvalidateCommand;
use metrics::Metrics as MetricsCommand;
use node_info::NodeInfo as NodeInfoCommand;
use produce::Produce as ProduceCommand;
use queue_stats::QueueStats as QueueStatsCommand;

use crate::broker::Broker;

/// Command definition - this enum contains all commands implemented by shardq.
#[derive(Debug, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    NodeInfo(NodeInfoCommand),
    Produce(ProduceCommand),
    Consume(ConsumeCommand),
    Ack(AckCommand),
    QueueStats(QueueStatsCommand),
    CacheGet(CacheGetCommand),
    CachePut(CachePutCommand),
    Invalidate(InvalidateCommand),
    Metrics(MetricsCommand),
}

impl Command {
    /// Executes a given command against the [`Broker`] provided and renders the HTTP response
    #[instrument(name = "cmd::execute", level = "info", skip(self, broker), fields(cmd = self.as_ref()))]
    pub async fn execute(self, broker: Arc<Broker>) -> Response {
        match self {
            Command::NodeInfo(cmd) => cmd.execute(broker).into_response(),
            Command::Produce(cmd) => cmd.execute(broker).await.into_response(),
            Command::Consume(cmd) => cmd.execute(broker).await.into_response(),
            Command::Ack(cmd) => cmd.execute(broker).await.map(Json).into_response(),
            Command::QueueStats(cmd) => cmd.execute(broker).await.into_response(),
            Command::CacheGet(cmd) => cmd.execute(broker).await.map(Json).into_response(),
            Command::CachePut(cmd) => cmd.execute(broker).await.map(Json).into_response(),
            Command::Invalidate(cmd) => cmd.execute(broker).map(Json).into_response(),
            Command::Metrics(cmd) => cmd.execute(broker).map(Json).into_response(),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use bytes::Bytes;
    use serde_json::json;

    use super::{
        ack::Ack, cache_get::CacheGet, cache_put::CachePut, invalidate::Invalidate,
        metrics::Metrics, produce::Produce, queue_stats::QueueStats, test_support, Command,
    };
    use crate::client::{mock::MockClientBuilder, ProxiedRequest, ProxiedResponse};

    #[tokio::test]
    async fn local_commands_render_json() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));

        let response = Command::Produce(Produce::new(
            "orders".to_string(),
            ProxiedRequest {
                method: "POST".to_string(),
                path_and_query: "/queue/orders".to_string(),
                headers: vec![],
                body: Bytes::from("{\"id\":1}"),
            },
        ))
        .execute(broker.clone())
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["status"], "message produced");
        assert_eq!(body["message"], json!({"id": 1}));
    }

    #[tokio::test]
    async fn forwarded_commands_render_the_owner_response() {
        let canned = ProxiedResponse {
            status: 202,
            headers: vec![
                ("content-type".to_string(), Bytes::from("application/json")),
                ("x-owner".to_string(), Bytes::from("B")),
            ],
            body: Bytes::from("{\"queue\":\"remote\",\"ready\":7}"),
        };
        let client = MockClientBuilder::new()
            .build()
            .with_response("127.0.0.1:3002", canned);
        let broker = test_support::broker(Arc::new(client));

        let response = Command::QueueStats(QueueStats::new(
            "remote".to_string(),
            ProxiedRequest {
                method: "GET".to_string(),
                path_and_query: "/queue/remote/stats".to_string(),
                ..Default::default()
            },
        ))
        .execute(broker)
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-owner"], "B");
        let body = test_support::body_json(response).await;
        assert_eq!(body, json!({"queue": "remote", "ready": 7}));
    }

    #[tokio::test]
    async fn node_local_commands_render_json() {
        let broker = test_support::broker(Arc::new(MockClientBuilder::new().build()));

        let response = Command::CachePut(CachePut::new("item:1".to_string(), json!({"v": 1})))
            .execute(broker.clone())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["status"], "data updated");
        assert_eq!(body["new_data"], json!({"v": 1}));

        let response = Command::CacheGet(CacheGet::new("item:1".to_string()))
            .execute(broker.clone())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["data"], json!({"v": 1}));
        assert_eq!(body["source"], "store");

        let response = Command::CacheGet(CacheGet::new("item:2".to_string()))
            .execute(broker.clone())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Command::Invalidate(Invalidate::new("item:1".to_string()))
            .execute(broker.clone())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["status"], "cache invalidated");
        assert_eq!(body["key"], "item:1");

        let response = Command::Metrics(Metrics).execute(broker.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["cache_misses"], 2);
        assert_eq!(body["cache_capacity"], 2);

        broker
            .queue()
            .produce_local("orders", json!({"id": 1}))
            .await
            .unwrap();
        let delivery = broker.queue().consume_local("orders").await.unwrap();
        let response = Command::Ack(Ack::new(delivery.ack_token, delivery.message))
            .execute(broker)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::body_json(response).await;
        assert_eq!(body["status"], "message acknowledged");
        assert_eq!(body["removed"], 1);
    }

    #[test]
    fn command_names() {
        let cmd = Command::Metrics(super::metrics::Metrics);
        assert_eq!(cmd.as_ref(), "metrics");
    }
}
