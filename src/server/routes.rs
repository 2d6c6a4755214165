//! HTTP routes exposed by every node.
//!
//! Handlers only extract request params and build the matching [`Command`]. Requests that may be
//! forwarded to another node are also captured as a [`ProxiedRequest`].
use std::sync::Arc;

use axum::{
    extract::{Path, Request},
    http::{HeaderMap, HeaderValue, Method, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use bytes::Bytes;
use tracing::{info_span, Instrument};

use crate::{
    broker::Broker,
    client::{is_hop_by_hop, ProxiedRequest, REQUEST_ID_HEADER},
    cmd::{
        ack::Ack, cache_get::CacheGet, cache_put::CachePut, consume::Consume,
        invalidate::Invalidate, metrics::Metrics, node_info::NodeInfo, produce::Produce,
        queue_stats::QueueStats, Command,
    },
    utils::generate_request_id,
};

pub fn router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/", get(node_info))
        .route("/queue/ack/:token", post(ack))
        .route("/queue/:queue", post(produce).get(consume))
        .route("/queue/:queue/stats", get(queue_stats))
        .route("/cache/invalidate/:key", post(invalidate))
        .route("/cache/:key", get(cache_get).post(cache_put))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(request_id))
        .layer(Extension(broker))
}

/// Tags every request with an id (reusing the caller's if present) and runs it inside a span
/// carrying that id. The id is written back into the request headers so forwarded requests keep it.
async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = match request.headers().get(REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let value = HeaderValue::from_str(&generate_request_id())
                .unwrap_or(HeaderValue::from_static("unknown"));
            request
                .headers_mut()
                .insert(REQUEST_ID_HEADER, value.clone());
            value
        }
    };

    let span = info_span!(
        "request",
        request_id = %String::from_utf8_lossy(request_id.as_bytes()),
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id);
    response
}

fn proxied_request(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> ProxiedRequest {
    ProxiedRequest {
        method: method.as_str().to_string(),
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        headers: headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    Bytes::copy_from_slice(value.as_bytes()),
                )
            })
            .collect(),
        body,
    }
}

async fn node_info(Extension(broker): Extension<Arc<Broker>>) -> Response {
    Command::NodeInfo(NodeInfo).execute(broker).await
}

async fn produce(
    Extension(broker): Extension<Arc<Broker>>,
    Path(queue): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = proxied_request(method, uri, headers, body);
    Command::Produce(Produce::new(queue, request))
        .execute(broker)
        .await
}

async fn consume(
    Extension(broker): Extension<Arc<Broker>>,
    Path(queue): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = proxied_request(method, uri, headers, body);
    Command::Consume(Consume::new(queue, request))
        .execute(broker)
        .await
}

async fn queue_stats(
    Extension(broker): Extension<Arc<Broker>>,
    Path(queue): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = proxied_request(method, uri, headers, body);
    Command::QueueStats(QueueStats::new(queue, request))
        .execute(broker)
        .await
}

async fn ack(
    Extension(broker): Extension<Arc<Broker>>,
    Path(token): Path<String>,
    body: Bytes,
) -> Response {
    match Ack::try_from_body(token, &body) {
        Ok(cmd) => Command::Ack(cmd).execute(broker).await,
        Err(err) => err.into_response(),
    }
}

async fn cache_get(Extension(broker): Extension<Arc<Broker>>, Path(key): Path<String>) -> Response {
    Command::CacheGet(CacheGet::new(key)).execute(broker).await
}

async fn cache_put(
    Extension(broker): Extension<Arc<Broker>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    match CachePut::try_from_body(key, &body) {
        Ok(cmd) => Command::CachePut(cmd).execute(broker).await,
        Err(err) => err.into_response(),
    }
}

async fn invalidate(
    Extension(broker): Extension<Arc<Broker>>,
    Path(key): Path<String>,
) -> Response {
    Command::Invalidate(Invalidate::new(key))
        .execute(broker)
        .await
}

async fn metrics(Extension(broker): Extension<Arc<Broker>>) -> Response {
    Command::Metrics(Metrics).execute(broker).await
}
