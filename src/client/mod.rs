//! Module that contains the HTTP client capabilities used by shardq.
//!
//! Two kinds of clients live here:
//!  1. [`Client`] - what a node uses to talk to its peers (request forwarding and cache invalidation)
//!  2. [`node_client::NodeClient`] - a typed client for the public API, used by the CLI and tests
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;

use self::error::{Error, Result};

pub mod error;
pub mod http_client;
pub mod mock;
pub mod node_client;

/// Header added to every request a node forwards to a peer
pub const FORWARDED_BY_HEADER: &str = "x-shardq-forwarded-by";
/// Header used to correlate a request across nodes
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Headers that describe a single connection and must not be copied to another hop
const HOP_BY_HOP_HEADERS: [&str; 5] = [
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "keep-alive",
];

pub fn is_hop_by_hop(header: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(header))
}

/// Builds `http://<addr>/<segments>`. Every segment is percent-encoded, so a key such as `a/b?c`
/// still maps to exactly one path segment on the receiving node.
pub fn endpoint(addr: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{}/", addr)).map_err(|e| Error::InvalidRequest {
        reason: format!("invalid node address {}: {}", addr, e),
    })?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidRequest {
            reason: format!("invalid node address {}", addr),
        })?
        .clear()
        .extend(segments);

    Ok(url)
}

/// An inbound HTTP request captured so that it can be re-issued against another node
#[derive(Clone, Debug, Default)]
pub struct ProxiedRequest {
    pub method: String,
    /// path plus query string, eg: `/queue/orders?x=1`
    pub path_and_query: String,
    pub headers: Vec<(String, Bytes)>,
    pub body: Bytes,
}

impl ProxiedRequest {
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Replaces (or adds) a header
    pub fn set_header(&mut self, name: &str, value: Bytes) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }
}

/// The response a peer produced for a [`ProxiedRequest`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxiedResponse {
    pub status: u16,
    pub headers: Vec<(String, Bytes)>,
    pub body: Bytes,
}

/// Trait that defines which calls a node is able to make against its peers
#[async_trait]
pub trait Client: Send + Sync {
    /// Re-issues `request` against the node listening on `addr` and returns whatever it answered
    async fn forward(&self, addr: &str, request: ProxiedRequest) -> Result<ProxiedResponse>;
    /// Asks the node listening on `addr` to drop `key` from its local cache
    async fn invalidate(&self, addr: &str, key: &str) -> Result<()>;
}
