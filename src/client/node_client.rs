//! A typed client for the public HTTP API exposed by every shardq node
use bytes::Bytes;
use reqwest::{IntoUrl, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cmd::{
    ack::AckResponse, cache_get::CacheGetResponse, cache_put::CachePutResponse,
    consume::ConsumeResponse, metrics::MetricsResponse, node_info::NodeInfoResponse,
    produce::ProduceResponse, queue_stats::QueueStatsResponse,
};

use super::{
    endpoint,
    error::{Error, Result},
};

/// NodeClient handle
#[derive(Clone, Debug)]
pub struct NodeClient {
    /// `<ip>:<port>` of the node this client talks to
    addr: String,
    inner: reqwest::Client,
}

impl NodeClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            inner: reqwest::Client::new(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Issues a request and returns the status code and body without interpreting them.
    /// `path` is sent as is, callers are responsible for encoding it.
    pub async fn raw(&self, method: Method, path: &str, body: Option<&Value>) -> Result<(u16, Bytes)> {
        self.send(method, format!("http://{}{}", self.addr, path), body)
            .await
    }

    async fn send<U: IntoUrl>(&self, method: Method, url: U, body: Option<&Value>) -> Result<(u16, Bytes)> {
        let mut request = self.inner.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        Ok((status, response.bytes().await?))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<T> {
        let url = endpoint(&self.addr, segments)?;
        let (status, body) = self.send(method, url, body).await?;
        match StatusCode::from_u16(status) {
            Ok(status) if status.is_success() => Ok(serde_json::from_slice(&body)?),
            Ok(StatusCode::NOT_FOUND) => Err(Error::NotFound {
                body: String::from_utf8_lossy(&body).into(),
            }),
            _ => Err(Error::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&body).into(),
            }),
        }
    }

    pub async fn produce(&self, queue: &str, message: &Value) -> Result<ProduceResponse> {
        self.call(Method::POST, &["queue", queue], Some(message))
            .await
    }

    pub async fn consume(&self, queue: &str) -> Result<ConsumeResponse> {
        self.call(Method::GET, &["queue", queue], None).await
    }

    pub async fn ack(&self, ack_token: &str, message: &Value) -> Result<AckResponse> {
        self.call(Method::POST, &["queue", "ack", ack_token], Some(message))
            .await
    }

    pub async fn queue_stats(&self, queue: &str) -> Result<QueueStatsResponse> {
        self.call(Method::GET, &["queue", queue, "stats"], None)
            .await
    }

    pub async fn cache_get(&self, key: &str) -> Result<CacheGetResponse> {
        self.call(Method::GET, &["cache", key], None).await
    }

    pub async fn cache_put(&self, key: &str, value: &Value) -> Result<CachePutResponse> {
        self.call(Method::POST, &["cache", key], Some(value))
            .await
    }

    pub async fn metrics(&self) -> Result<MetricsResponse> {
        self.call(Method::GET, &["metrics"], None).await
    }

    pub async fn node_info(&self) -> Result<NodeInfoResponse> {
        self.call(Method::GET, &[], None).await
    }
}
