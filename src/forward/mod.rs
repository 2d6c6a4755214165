//! Request forwarding between peers.
//!
//! When a node receives a request for a shard it doesn't own, the request is re-issued
//! (same method, headers, path and body) against the owner and the owner's answer is handed back
//! to the caller untouched. From the client's point of view the two responses are identical.
use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{event, instrument, Level};

use crate::{
    client::{is_hop_by_hop, Client, ProxiedRequest, ProxiedResponse, FORWARDED_BY_HEADER},
    cluster::state::Node,
    error::{Error, Result},
};

/// The outcome of an operation that may have been served by another node.
///
/// Resolved once per request at the routing boundary: either this node executed the
/// operation itself, or the owner did and we only carry its raw response back.
#[derive(Debug)]
pub enum Routed<T> {
    Local(T),
    Forwarded(ProxiedResponse),
}

impl<T> Routed<T> {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Routed::Forwarded(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Routed<U> {
        match self {
            Routed::Local(value) => Routed::Local(f(value)),
            Routed::Forwarded(response) => Routed::Forwarded(response),
        }
    }
}

impl<T: Serialize> IntoResponse for Routed<T> {
    fn into_response(self) -> Response {
        match self {
            Routed::Local(value) => Json(value).into_response(),
            Routed::Forwarded(response) => response.into_response(),
        }
    }
}

/// Replays the owner's answer: same status, same body, same end-to-end headers
impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if is_hop_by_hop(&name) {
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => event!(Level::WARN, "dropping invalid header {} from owner response", name),
            }
        }

        response
    }
}

/// Returns true if `request` was already forwarded by some other node
pub fn was_forwarded(request: &ProxiedRequest) -> bool {
    request.header(FORWARDED_BY_HEADER).is_some()
}

pub struct Forwarder {
    own_id: String,
    client: Arc<dyn Client>,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("own_id", &self.own_id)
            .finish()
    }
}

impl Forwarder {
    pub fn new(own_id: impl Into<String>, client: Arc<dyn Client>) -> Self {
        Self {
            own_id: own_id.into(),
            client,
        }
    }

    /// Re-issues `request` against `owner`. Single attempt, no retries.
    ///
    /// # Errors
    /// [`Error::UpstreamUnavailable`] if the owner couldn't be reached or didn't answer in time.
    /// Any HTTP status the owner answers with (including 4xx/5xx) is a successful forward.
    #[instrument(name = "forward::proxy", level = "info", skip(self, request), fields(owner = %owner.id))]
    pub async fn proxy(&self, owner: &Node, mut request: ProxiedRequest) -> Result<ProxiedResponse> {
        request.set_header(FORWARDED_BY_HEADER, Bytes::from(self.own_id.clone()));

        match self.client.forward(&owner.addr, request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                event!(
                    Level::WARN,
                    "unable to forward request to {} ({}): {}",
                    owner.id,
                    owner.addr,
                    err
                );
                Err(Error::UpstreamUnavailable {
                    node: owner.id.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
