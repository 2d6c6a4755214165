//! A concrete [`Client`] implementation backed by [`reqwest`]
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tracing::{event, instrument, Level};

use super::error::{Error, Result};
use super::{endpoint, is_hop_by_hop, Client, ProxiedRequest, ProxiedResponse};

/// HttpClient handle. Cheap to clone, all clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
    forward_timeout: Duration,
    invalidate_timeout: Duration,
}

impl HttpClient {
    pub fn new(forward_timeout: Duration, invalidate_timeout: Duration) -> Self {
        Self {
            inner: reqwest::Client::new(),
            forward_timeout,
            invalidate_timeout,
        }
    }
}

fn build_headers(headers: &[(String, Bytes)]) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name) {
            continue;
        }

        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidRequest {
            reason: e.to_string(),
        })?;
        let value = HeaderValue::from_bytes(value).map_err(|e| Error::InvalidRequest {
            reason: e.to_string(),
        })?;
        header_map.append(name, value);
    }

    Ok(header_map)
}

#[async_trait]
impl Client for HttpClient {
    #[instrument(name = "client::http::forward", level = "info", skip(self, request), fields(method = %request.method, path = %request.path_and_query))]
    async fn forward(&self, addr: &str, request: ProxiedRequest) -> Result<ProxiedResponse> {
        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| Error::InvalidRequest {
                reason: e.to_string(),
            })?;
        let url = format!("http://{}{}", addr, request.path_and_query);

        let response = self
            .inner
            .request(method, url)
            .headers(build_headers(&request.headers)?)
            .body(request.body)
            .timeout(self.forward_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    Bytes::copy_from_slice(value.as_bytes()),
                )
            })
            .collect();
        let body = response.bytes().await?;

        event!(Level::DEBUG, "peer {} answered forwarded request with {}", addr, status);
        Ok(ProxiedResponse {
            status,
            headers,
            body,
        })
    }

    #[instrument(name = "client::http::invalidate", level = "debug", skip(self))]
    async fn invalidate(&self, addr: &str, key: &str) -> Result<()> {
        let url = endpoint(addr, &["cache", "invalidate", key])?;
        let response = self
            .inner
            .post(url)
            .timeout(self.invalidate_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
